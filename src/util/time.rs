use chrono::{DateTime, Utc};

use crate::model::{parse_datetime, Article};

/// Human-readable age of `time` relative to `now`.
///
/// - under an hour: `"5 minutes ago"` / `"1 minute ago"`
/// - under a day: `"3 hours ago"`
/// - under a week: `"2 days ago"`
/// - otherwise the calendar date, e.g. `"Jan 5, 2024"`
///
/// Times in the future read as `"0 minutes ago"`.
pub fn format_relative(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(time);
    let minutes = elapsed.num_minutes().max(0);
    let hours = elapsed.num_hours().max(0);
    let days = elapsed.num_days().max(0);

    if minutes < 60 {
        format!("{} minute{} ago", minutes, plural(minutes))
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else if days < 7 {
        format!("{} day{} ago", days, plural(days))
    } else {
        time.format("%b %-d, %Y").to_string()
    }
}

/// Full date and time for the article detail view,
/// e.g. `"Friday, January 5, 2024 at 02:30 PM"`.
pub fn format_long(time: DateTime<Utc>) -> String {
    time.format("%A, %B %-d, %Y at %I:%M %p").to_string()
}

/// Best available time for an article: `published` when it parses,
/// otherwise the fallback `timestamp`.
pub fn article_time(article: &Article) -> Option<DateTime<Utc>> {
    article
        .published
        .as_deref()
        .and_then(parse_datetime)
        .or_else(|| article.timestamp.as_ref().and_then(|ts| ts.to_datetime()))
}

/// Relative age for list rows; `"Recently"` when the article carries no time.
pub fn describe_age(article: &Article, now: DateTime<Utc>) -> String {
    article_time(article)
        .map(|time| format_relative(time, now))
        .unwrap_or_else(|| "Recently".to_string())
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Timestamp;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_minutes() {
        assert_eq!(format_relative(now(), now()), "0 minutes ago");
        assert_eq!(format_relative(now() - Duration::minutes(1), now()), "1 minute ago");
        assert_eq!(format_relative(now() - Duration::minutes(59), now()), "59 minutes ago");
    }

    #[test]
    fn test_hours_and_days() {
        assert_eq!(format_relative(now() - Duration::minutes(60), now()), "1 hour ago");
        assert_eq!(format_relative(now() - Duration::hours(23), now()), "23 hours ago");
        assert_eq!(format_relative(now() - Duration::hours(24), now()), "1 day ago");
        assert_eq!(format_relative(now() - Duration::days(6), now()), "6 days ago");
    }

    #[test]
    fn test_older_than_a_week_shows_date() {
        let then = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        assert_eq!(format_relative(then, now()), "Jan 5, 2024");
    }

    #[test]
    fn test_future_clamps_to_zero() {
        assert_eq!(format_relative(now() + Duration::hours(2), now()), "0 minutes ago");
    }

    #[test]
    fn test_format_long() {
        let then = Utc.with_ymd_and_hms(2024, 1, 5, 14, 30, 0).unwrap();
        assert_eq!(format_long(then), "Friday, January 5, 2024 at 02:30 PM");
    }

    #[test]
    fn test_article_time_prefers_published() {
        let article = Article {
            published: Some("2024-03-15T11:00:00Z".into()),
            timestamp: Some(Timestamp::Integer(0)),
            ..Article::default()
        };
        assert_eq!(describe_age(&article, now()), "1 hour ago");
    }

    #[test]
    fn test_article_time_falls_back_to_timestamp() {
        let ten_minutes_ago = (now() - Duration::minutes(10)).timestamp_millis();
        let article = Article {
            published: Some("garbage".into()),
            timestamp: Some(Timestamp::Integer(ten_minutes_ago)),
            ..Article::default()
        };
        assert_eq!(describe_age(&article, now()), "10 minutes ago");
        assert_eq!(describe_age(&Article::default(), now()), "Recently");
    }
}
