//! Fixture pages and an in-process HTTP server for tests.

use axum::Router;
use chrono::NaiveDate;
use url::Url;

use crate::sources::announcement_header;

/// Serve `router` on an ephemeral local port and return its base URL
pub(crate) async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{}/", addr)).unwrap()
}

/// Advisory page with yesterday's block and an agricultural-only block for `date`
pub(crate) fn advisory_page(date: NaiveDate) -> String {
    let yesterday = date.pred_opt().unwrap_or(date);
    format!(
        "<html><body>
<pre><b>{}</b>
Agricultural burning: * When allowed locally and based on air quality considerations recommend agricultural burning
    be limited to the period from 1:00 p.m. to 3:00 p.m.
</pre>
<pre><b>{}</b>
Agricultural burning: * When allowed locally and based on air quality considerations recommend agricultural burning
    be limited to the period from 9:30 a.m. to 4:00 p.m.

Backyard burning inside special control areas: * Backyard burning is not allowed today.
</pre>
</body></html>",
        announcement_header(yesterday),
        announcement_header(date)
    )
}

pub(crate) fn restriction_page(level: &str) -> String {
    format!(
        r#"<html><body>
<h2 class="fire-level"><span>Current Public Use Restriction Level:</span><br><span> {} </span></h2>
</body></html>"#,
        level
    )
}
