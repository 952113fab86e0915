use crate::domain::model::{CertificateSummary, DomainState, RenewalPlan};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

const END_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The API reports end times in China Standard Time without an offset.
const API_UTC_OFFSET_SECS: i32 = 8 * 3600;

pub const DEFAULT_RENEW_BEFORE_DAYS: i64 = 30;

pub fn parse_end_time(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), END_TIME_FORMAT).ok()?;
    let offset = FixedOffset::east_opt(API_UTC_OFFSET_SECS)?;
    naive
        .and_local_timezone(offset)
        .single()
        .map(|t| t.with_timezone(&Utc))
}

/// True when the certificate expires within `renew_before` of `now`.
/// Missing or malformed end times count as expiring.
pub fn is_near_expiry(
    cert: &CertificateSummary,
    now: DateTime<Utc>,
    renew_before: chrono::Duration,
) -> bool {
    match cert.cert_end_time.as_deref().and_then(parse_end_time) {
        Some(end) => end - now <= renew_before,
        None => {
            tracing::warn!(
                "Certificate {} has no usable end time ({:?}), treating as expiring",
                cert.certificate_id,
                cert.cert_end_time
            );
            true
        }
    }
}

/// Groups certificates by domain. A domain is due for renewal only when none
/// of its certificates stays valid past the threshold.
pub fn plan_renewals(
    certificates: &[CertificateSummary],
    now: DateTime<Utc>,
    renew_before: chrono::Duration,
    domain_filter: &[String],
) -> RenewalPlan {
    let mut plan = RenewalPlan::default();
    let mut latest_end: std::collections::HashMap<String, Option<DateTime<Utc>>> =
        std::collections::HashMap::new();

    for cert in certificates {
        let Some(domain) = cert.domain.as_deref().map(str::trim).filter(|d| !d.is_empty()) else {
            tracing::debug!("Skipping certificate {} without domain", cert.certificate_id);
            continue;
        };

        if !domain_filter.is_empty() && !domain_filter.iter().any(|d| d == domain) {
            tracing::debug!("Skipping {} (not in domain filter)", domain);
            continue;
        }

        let near_expiry = is_near_expiry(cert, now, renew_before);
        let end = cert.cert_end_time.as_deref().and_then(parse_end_time);

        let state = plan
            .domains
            .entry(domain.to_string())
            .or_insert_with(|| DomainState {
                needs_renewal: true,
                certificate_id: None,
            });
        state.needs_renewal &= near_expiry;

        let known = latest_end.entry(domain.to_string()).or_insert(None);
        if state.certificate_id.is_none() || end > *known {
            *known = end;
            state.certificate_id = Some(cert.certificate_id.clone());
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cert(id: &str, domain: Option<&str>, end: Option<&str>) -> CertificateSummary {
        CertificateSummary {
            certificate_id: id.to_string(),
            domain: domain.map(str::to_string),
            cert_end_time: end.map(str::to_string),
            status: Some(1),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn days(n: i64) -> chrono::Duration {
        chrono::Duration::days(n)
    }

    #[test]
    fn test_parse_end_time_uses_china_standard_time() {
        let parsed = parse_end_time("2024-06-01 08:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert!(parse_end_time("2024/06/01").is_none());
    }

    #[test]
    fn test_near_expiry_threshold() {
        // 10 days left
        let soon = cert("a", Some("a.com"), Some("2024-06-11 08:00:00"));
        assert!(is_near_expiry(&soon, now(), days(30)));

        // 90 days left
        let later = cert("b", Some("b.com"), Some("2024-08-30 08:00:00"));
        assert!(!is_near_expiry(&later, now(), days(30)));

        let unknown = cert("c", Some("c.com"), None);
        assert!(is_near_expiry(&unknown, now(), days(30)));

        let garbage = cert("d", Some("d.com"), Some("soon"));
        assert!(is_near_expiry(&garbage, now(), days(30)));
    }

    #[test]
    fn test_domain_with_one_valid_certificate_is_not_renewed() {
        let certs = vec![
            cert("old", Some("example.com"), Some("2024-06-05 00:00:00")),
            cert("new", Some("example.com"), Some("2025-06-05 00:00:00")),
            cert("older", Some("example.com"), Some("2024-01-05 00:00:00")),
        ];
        let plan = plan_renewals(&certs, now(), days(30), &[]);
        let state = &plan.domains["example.com"];
        assert!(!state.needs_renewal);
        assert_eq!(state.certificate_id.as_deref(), Some("new"));
        assert_eq!(plan.due_count(), 0);
    }

    #[test]
    fn test_domain_with_only_expiring_certificates_is_renewed() {
        let certs = vec![
            cert("x1", Some("shop.example.com"), Some("2024-06-05 00:00:00")),
            cert("x2", Some("shop.example.com"), Some("2024-05-01 00:00:00")),
            cert("y1", Some("api.example.com"), Some("2025-01-01 00:00:00")),
        ];
        let plan = plan_renewals(&certs, now(), days(30), &[]);
        assert_eq!(plan.due().collect::<Vec<_>>(), vec!["shop.example.com"]);
        assert_eq!(
            plan.domains["shop.example.com"].certificate_id.as_deref(),
            Some("x1")
        );
    }

    #[test]
    fn test_certificates_without_domain_are_ignored() {
        let certs = vec![
            cert("x", None, Some("2024-06-05 00:00:00")),
            cert("y", Some("  "), Some("2024-06-05 00:00:00")),
        ];
        let plan = plan_renewals(&certs, now(), days(30), &[]);
        assert!(plan.domains.is_empty());
    }

    #[test]
    fn test_domain_filter() {
        let certs = vec![
            cert("a", Some("a.com"), Some("2024-06-05 00:00:00")),
            cert("b", Some("b.com"), Some("2024-06-05 00:00:00")),
        ];
        let plan = plan_renewals(&certs, now(), days(30), &["b.com".to_string()]);
        assert_eq!(plan.due().collect::<Vec<_>>(), vec!["b.com"]);
        assert!(!plan.domains.contains_key("a.com"));
    }
}
