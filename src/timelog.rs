// SPDX-License-Identifier: MPL-2.0

use chrono::NaiveDate;

use crate::{auth::AccessToken, error::SubmitError, http::Transport};

/// The parts of a timelog that stay the same for every submitted day.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelogTemplate {
    pub job_id: String,
    pub hours: f64,
    pub user: String,
    pub work_item: Option<String>,
}

impl TimelogTemplate {
    pub fn entry(&self, work_date: NaiveDate) -> TimelogEntry {
        TimelogEntry {
            job_id: self.job_id.clone(),
            hours: self.hours,
            work_date,
            user: self.user.clone(),
            work_item: self.work_item.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelogEntry {
    pub job_id: String,
    pub hours: f64,
    pub work_date: NaiveDate,
    pub user: String,
    pub work_item: Option<String>,
}

impl TimelogEntry {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("user", self.user.clone()),
            ("workDate", self.work_date.format("%Y-%m-%d").to_string()),
            ("jobId", self.job_id.clone()),
            ("hours", self.hours.to_string()),
        ];
        if let Some(work_item) = self.work_item.as_deref().filter(|w| !w.trim().is_empty()) {
            query.push(("workItem", work_item.to_owned()));
        }
        query
    }
}

pub struct TimelogSubmitter<'a, T> {
    transport: &'a T,
    url: String,
}

impl<'a, T: Transport> TimelogSubmitter<'a, T> {
    pub fn new(transport: &'a T, api_domain: &str) -> Self {
        Self {
            transport,
            url: format!(
                "{}/people/api/timetracker/addtimelog",
                api_domain.trim_end_matches('/')
            ),
        }
    }

    /// Creates one timelog record.  Calling this twice for the same entry
    /// creates two records.
    pub fn submit(&self, token: &AccessToken, entry: &TimelogEntry) -> Result<(), SubmitError> {
        let response = self
            .transport
            .post_query(&self.url, token.secret(), &entry.query())?;
        if response.is_ok() {
            Ok(())
        } else {
            Err(SubmitError::Rejected {
                status: response.status,
                body: response.body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeTransport;

    fn template(work_item: Option<&str>) -> TimelogTemplate {
        TimelogTemplate {
            job_id: "413".to_owned(),
            hours: 7.5,
            user: "me@example.com".to_owned(),
            work_item: work_item.map(str::to_owned),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
    }

    #[test]
    fn posts_entry_to_addtimelog_endpoint() {
        let transport = FakeTransport::new().respond(200, "{}");
        let submitter = TimelogSubmitter::new(&transport, "https://people.zoho.com/");
        let token = AccessToken::new("1000.access");

        submitter
            .submit(&token, &template(Some("Reviews")).entry(day()))
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(
            request.url,
            "https://people.zoho.com/people/api/timetracker/addtimelog"
        );
        assert_eq!(request.bearer.as_deref(), Some("1000.access"));
        assert_eq!(request.param("user"), Some("me@example.com"));
        assert_eq!(request.param("workDate"), Some("2024-04-02"));
        assert_eq!(request.param("jobId"), Some("413"));
        assert_eq!(request.param("hours"), Some("7.5"));
        assert_eq!(request.param("workItem"), Some("Reviews"));
    }

    #[test]
    fn omits_missing_or_blank_work_item() {
        let transport = FakeTransport::new();
        let submitter = TimelogSubmitter::new(&transport, "https://people.zoho.com");
        let token = AccessToken::new("t");

        submitter.submit(&token, &template(None).entry(day())).unwrap();
        submitter
            .submit(&token, &template(Some(" ")).entry(day()))
            .unwrap();

        for request in transport.requests() {
            assert_eq!(request.param("workItem"), None);
        }
    }

    #[test]
    fn non_200_is_a_submit_failure() {
        let transport = FakeTransport::new().respond(500, "oops");
        let submitter = TimelogSubmitter::new(&transport, "https://people.zoho.com");

        let err = submitter
            .submit(&AccessToken::new("t"), &template(None).entry(day()))
            .unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Rejected { status: 500, ref body } if body == "oops"
        ));
    }

    #[test]
    fn transport_errors_are_submit_failures() {
        let transport = FakeTransport::new().fail("connection refused");
        let submitter = TimelogSubmitter::new(&transport, "https://people.zoho.com");

        let err = submitter
            .submit(&AccessToken::new("t"), &template(None).entry(day()))
            .unwrap_err();
        assert!(matches!(err, SubmitError::Transport(_)));
    }
}
