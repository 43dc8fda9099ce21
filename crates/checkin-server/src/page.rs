//! HTML rendering for the single page the service serves.

use std::fmt::Write;

use checkin_core::Ledger;

use crate::utils::{escape_html, format_timestamp};

/// One row of the history table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub occurred: String,
    pub next: String,
    pub ended: bool,
}

#[derive(Debug, Clone)]
pub struct PageData {
    pub title: String,
    pub message: String,
    pub authenticated: bool,
    pub show_input: bool,
    pub rows: Vec<HistoryRow>,
}

impl PageData {
    pub fn login() -> Self {
        Self {
            title: "Log in".to_string(),
            message: "Please enter your username and password".to_string(),
            authenticated: false,
            show_input: false,
            rows: Vec::new(),
        }
    }

    pub fn dashboard(username: &str, ledger: &Ledger, now: i64) -> Self {
        let rows = ledger
            .records
            .iter()
            .map(|record| HistoryRow {
                occurred: format_timestamp(record.occurred_at),
                next: format_timestamp(record.next_allowed_at),
                ended: record.has_elapsed(now),
            })
            .collect();

        Self {
            title: "View data".to_string(),
            message: format!("Welcome back {}. Check in after the timeout", username),
            authenticated: true,
            show_input: ledger.can_check_in(now),
            rows,
        }
    }
}

pub fn render(page: &PageData) -> String {
    let mut html = String::new();
    let title = escape_html(&page.title);

    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<p>{}</p>\n",
        escape_html(&page.message),
    );

    if page.authenticated {
        render_dashboard(&mut html, page);
    } else {
        html.push_str(
            "<form method=\"post\" action=\"/login\">\n\
             <label>Username <input type=\"text\" name=\"username\" autocomplete=\"username\" required></label>\n\
             <label>Password <input type=\"password\" name=\"password\" autocomplete=\"current-password\" required></label>\n\
             <button type=\"submit\">Log in</button>\n</form>\n",
        );
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_dashboard(html: &mut String, page: &PageData) {
    if page.show_input {
        html.push_str(
            "<form method=\"post\" action=\"/post\">\n\
             <label>Hours until next check-in <input type=\"number\" name=\"next\" min=\"0\" step=\"1\" value=\"24\" required></label>\n\
             <button type=\"submit\">Check in</button>\n</form>\n",
        );
    }

    if !page.rows.is_empty() {
        html.push_str(
            "<table>\n<thead><tr><th>Checked in</th><th>Next check-in</th><th>Ended</th></tr></thead>\n<tbody>\n",
        );
        for row in &page.rows {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&row.occurred),
                escape_html(&row.next),
                row.ended,
            );
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str(
        "<form method=\"post\" action=\"/logout\">\n<button type=\"submit\">Log out</button>\n</form>\n",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::CheckInRecord;

    fn ledger(records: &[(i64, i64)]) -> Ledger {
        let mut ledger = Ledger::new("sam");
        for &(current, hours) in records {
            ledger.append(CheckInRecord::new(current, hours).unwrap()).unwrap();
        }
        ledger
    }

    #[test]
    fn test_login_page_has_form_and_no_history() {
        let html = render(&PageData::login());
        assert!(html.contains("<title>Log in</title>"));
        assert!(html.contains("action=\"/login\""));
        assert!(!html.contains("action=\"/post\""));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_dashboard_rows_and_ended_flags() {
        let ledger = ledger(&[(0, 1), (7_200, 24)]);
        let page = PageData::dashboard("sam", &ledger, 10_000);

        assert_eq!(page.title, "View data");
        assert_eq!(page.message, "Welcome back sam. Check in after the timeout");
        assert!(!page.show_input);
        assert_eq!(
            page.rows,
            vec![
                HistoryRow {
                    occurred: "1970-01-01 00:00:00".into(),
                    next: "1970-01-01 01:00:00".into(),
                    ended: true,
                },
                HistoryRow {
                    occurred: "1970-01-01 02:00:00".into(),
                    next: "1970-01-02 02:00:00".into(),
                    ended: false,
                },
            ]
        );

        let html = render(&page);
        assert!(html.contains("<td>1970-01-02 02:00:00</td><td>false</td>"));
        assert!(!html.contains("action=\"/post\""));
        assert!(html.contains("action=\"/logout\""));
    }

    #[test]
    fn test_dashboard_shows_input_when_allowed() {
        let page = PageData::dashboard("sam", &ledger(&[]), 0);
        assert!(page.show_input);

        let html = render(&page);
        assert!(html.contains("action=\"/post\""));
        assert!(html.contains("name=\"next\""));
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_username_is_escaped() {
        let page = PageData::dashboard("<script>", &ledger(&[]), 0);
        let html = render(&page);
        assert!(html.contains("Welcome back &lt;script&gt;."));
        assert!(!html.contains("<script>"));
    }
}
