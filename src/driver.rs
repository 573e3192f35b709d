// SPDX-License-Identifier: MPL-2.0

use chrono::NaiveDate;

use crate::{
    auth::Authenticator,
    calendar::{DateRange, SkipPolicy, SkipReason},
    credentials::CredentialSource,
    error::RunError,
    http::Transport,
    timelog::{TimelogSubmitter, TimelogTemplate},
};

/// What happened to each day of a run, in date order.
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub submitted: Vec<NaiveDate>,
    pub failed: Vec<NaiveDate>,
    pub skipped: Vec<(NaiveDate, SkipReason)>,
}

pub struct Driver<'a, T> {
    pub transport: &'a T,
    pub credentials: &'a dyn CredentialSource,
    pub api_domain: &'a str,
    pub policy: &'a SkipPolicy,
}

impl<'a, T: Transport> Driver<'a, T> {
    /// Authenticates once, then submits one timelog per day of `range` that
    /// the skip policy lets through.
    ///
    /// Failing to get a token aborts before anything is submitted.  Failing
    /// to submit a single day is logged and the run carries on.
    pub fn run(
        &self,
        range: DateRange,
        template: &TimelogTemplate,
    ) -> Result<RunSummary, RunError> {
        let credentials = self.credentials.load()?;
        let grant = Authenticator::new(self.transport, &credentials)
            .get_access_token()
            .inspect_err(|err| {
                log::error!("Failed to obtain an access token, no timelogs submitted: {err}")
            })?;

        if let Some(refresh_token) = &grant.new_refresh_token {
            if let Err(err) = self.credentials.save_refresh_token(refresh_token) {
                log::warn!("{err}; the auth code will have to be regenerated for the next run");
            }
        }

        if range.from > range.to {
            log::warn!("Date range {range} is empty, nothing to submit");
        }

        let submitter = TimelogSubmitter::new(self.transport, self.api_domain);
        let mut summary = RunSummary::default();
        for day in range.days() {
            if let Some(reason) = self.policy.skip_reason(day) {
                log::info!("Skipped {day} due to {reason}");
                summary.skipped.push((day, reason));
                continue;
            }

            match submitter.submit(&grant.access_token, &template.entry(day)) {
                Ok(()) => {
                    log::info!("Timelog added for {day}");
                    summary.submitted.push(day);
                }
                Err(err) => {
                    log::error!("Failed to add timelog for {day}: {err}");
                    summary.failed.push(day);
                }
            }
        }

        log::info!(
            "Time logging completed: {} submitted, {} failed, {} skipped",
            summary.submitted.len(),
            summary.failed.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::credentials::{Credentials, DEFAULT_OAUTH_DOMAIN};
    use crate::error::ConfigError;
    use crate::http::fake::FakeTransport;

    const API: &str = "https://people.zoho.com";
    const TOKEN_URL: &str = "https://accounts.zoho.com/oauth/v2/token";

    struct MemoryCredentials {
        credentials: Credentials,
        saved: RefCell<Vec<String>>,
        fail_save: bool,
    }

    impl MemoryCredentials {
        fn new(refresh_token: Option<&str>, auth_code: Option<&str>) -> Self {
            Self {
                credentials: Credentials {
                    client_id: "client".to_owned(),
                    client_secret: "secret".to_owned(),
                    refresh_token: refresh_token.map(str::to_owned),
                    auth_code: auth_code.map(str::to_owned),
                    oauth_domain: DEFAULT_OAUTH_DOMAIN.to_owned(),
                },
                saved: RefCell::new(Vec::new()),
                fail_save: false,
            }
        }
    }

    impl CredentialSource for MemoryCredentials {
        fn load(&self) -> Result<Credentials, ConfigError> {
            Ok(self.credentials.clone())
        }

        fn save_refresh_token(&self, refresh_token: &str) -> Result<(), ConfigError> {
            if self.fail_save {
                return Err(ConfigError::Persist {
                    path: "memory".into(),
                    reason: "read-only".to_owned(),
                });
            }
            self.saved.borrow_mut().push(refresh_token.to_owned());
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template() -> TimelogTemplate {
        TimelogTemplate {
            job_id: "413".to_owned(),
            hours: 8.0,
            user: "me@example.com".to_owned(),
            work_item: None,
        }
    }

    fn run(
        transport: &FakeTransport,
        credentials: &MemoryCredentials,
        policy: &SkipPolicy,
        range: DateRange,
    ) -> Result<RunSummary, RunError> {
        Driver {
            transport,
            credentials,
            api_domain: API,
            policy,
        }
        .run(range, &template())
    }

    fn submitted_dates(transport: &FakeTransport) -> Vec<String> {
        transport
            .requests()
            .iter()
            .filter(|request| request.url != TOKEN_URL)
            .filter_map(|request| request.param("workDate").map(str::to_owned))
            .collect()
    }

    #[test]
    fn skips_weekend_and_holiday_in_five_day_range() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token": "a"}"#);
        let credentials = MemoryCredentials::new(Some("r"), None);
        // Wednesday 2024-04-03 is a holiday, 2024-04-06 is a Saturday
        let policy = SkipPolicy::new(["2024-04-03".to_owned()], Vec::new());

        let summary = run(
            &transport,
            &credentials,
            &policy,
            DateRange::new(date(2024, 4, 2), date(2024, 4, 6)),
        )
        .unwrap();

        assert_eq!(
            submitted_dates(&transport),
            vec!["2024-04-02", "2024-04-04", "2024-04-05"]
        );
        assert_eq!(summary.submitted.len(), 3);
        assert_eq!(
            summary.skipped,
            vec![
                (date(2024, 4, 3), SkipReason::Holiday),
                (date(2024, 4, 6), SkipReason::Weekend)
            ]
        );
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn every_day_gets_exactly_one_decision() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token": "a"}"#);
        let credentials = MemoryCredentials::new(Some("r"), None);
        let policy = SkipPolicy::new(["2024-04-03".to_owned()], ["2024-04-10".to_owned()]);
        let range = DateRange::new(date(2024, 4, 1), date(2024, 4, 30));

        let summary = run(&transport, &credentials, &policy, range).unwrap();

        let decided = summary.submitted.len() + summary.failed.len() + summary.skipped.len();
        assert_eq!(decided, 30);
        assert_eq!(transport.requests().len(), 1 + summary.submitted.len());
    }

    #[test]
    fn auth_failure_submits_nothing() {
        let transport = FakeTransport::new().respond(401, "unauthorized");
        let credentials = MemoryCredentials::new(Some("r"), None);

        let err = run(
            &transport,
            &credentials,
            &SkipPolicy::default(),
            DateRange::new(date(2024, 4, 1), date(2024, 4, 5)),
        )
        .unwrap_err();

        assert!(matches!(err, RunError::Auth(_)));
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].url, TOKEN_URL);
    }

    #[test]
    fn failed_submission_does_not_stop_the_run() {
        let transport = FakeTransport::new()
            .respond(200, r#"{"access_token": "a"}"#)
            .respond(200, "{}")
            .respond(500, "internal error")
            .respond(200, "{}");
        let credentials = MemoryCredentials::new(Some("r"), None);

        let summary = run(
            &transport,
            &credentials,
            &SkipPolicy::default(),
            DateRange::new(date(2024, 4, 1), date(2024, 4, 3)),
        )
        .unwrap();

        assert_eq!(summary.submitted, vec![date(2024, 4, 1), date(2024, 4, 3)]);
        assert_eq!(summary.failed, vec![date(2024, 4, 2)]);
        assert_eq!(
            submitted_dates(&transport),
            vec!["2024-04-01", "2024-04-02", "2024-04-03"]
        );
    }

    #[test]
    fn reversed_range_submits_nothing() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token": "a"}"#);
        let credentials = MemoryCredentials::new(Some("r"), None);

        let summary = run(
            &transport,
            &credentials,
            &SkipPolicy::default(),
            DateRange::new(date(2024, 4, 5), date(2024, 4, 1)),
        )
        .unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(submitted_dates(&transport).is_empty());
    }

    #[test]
    fn rotated_refresh_token_is_persisted() {
        let transport = FakeTransport::new().respond(
            200,
            r#"{"access_token": "a", "refresh_token": "1000.new"}"#,
        );
        let credentials = MemoryCredentials::new(None, Some("1000.code"));

        run(
            &transport,
            &credentials,
            &SkipPolicy::default(),
            DateRange::new(date(2024, 4, 1), date(2024, 4, 1)),
        )
        .unwrap();

        assert_eq!(*credentials.saved.borrow(), vec!["1000.new".to_owned()]);
    }

    #[test]
    fn failing_to_persist_refresh_token_still_submits() {
        let transport = FakeTransport::new().respond(
            200,
            r#"{"access_token": "a", "refresh_token": "1000.new"}"#,
        );
        let mut credentials = MemoryCredentials::new(None, Some("1000.code"));
        credentials.fail_save = true;

        let summary = run(
            &transport,
            &credentials,
            &SkipPolicy::default(),
            DateRange::new(date(2024, 4, 1), date(2024, 4, 2)),
        )
        .unwrap();

        assert_eq!(summary.submitted.len(), 2);
    }

    #[test]
    fn submissions_carry_the_access_token() {
        let transport = FakeTransport::new().respond(200, r#"{"access_token": "1000.access"}"#);
        let credentials = MemoryCredentials::new(Some("r"), None);

        run(
            &transport,
            &credentials,
            &SkipPolicy::default(),
            DateRange::new(date(2024, 4, 1), date(2024, 4, 1)),
        )
        .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[1].bearer.as_deref(), Some("1000.access"));
        assert_eq!(requests[1].param("jobId"), Some("413"));
        assert_eq!(requests[1].param("hours"), Some("8"));
    }
}
