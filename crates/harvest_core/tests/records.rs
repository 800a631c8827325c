use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use harvest_core::{
    assess_freshness, fingerprint, most_recent, Freshness, Record, RecordSet, Upsert,
};
use pretty_assertions::assert_eq;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn record(title: &str, date_text: &str, published: (i32, u32, u32)) -> Record {
    let (y, m, d) = published;
    Record {
        id: fingerprint(title, date_text),
        fetched_at: now(),
        published_at: NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        title: title.to_string(),
        excerpt: format!("{title} excerpt"),
        url: format!("https://example.com/{title}"),
        image_url: format!("https://example.com/{title}.jpg"),
        content: String::new(),
    }
}

#[test]
fn fingerprint_is_deterministic() {
    assert_eq!(fingerprint("A", "2020-01-01"), fingerprint("A", "2020-01-01"));
    assert_ne!(fingerprint("A", "2020-01-01"), fingerprint("A", "2020-01-02"));
}

#[test]
fn upsert_replaces_without_duplicating() {
    let mut set = RecordSet::new();
    let first = record("a", "01.01.2023", (2023, 1, 1));
    let mut second = first.clone();
    second.content = "<p>body</p>".to_string();

    assert_eq!(set.upsert(first.clone()), Upsert::Inserted);
    assert_eq!(set.upsert(second.clone()), Upsert::Replaced);
    assert_eq!(set.len(), 1);
    assert!(set.exists(&first.id));
    assert_eq!(set.get(&first.id), Some(&second));
}

#[test]
fn replace_keeps_insertion_position() {
    let a = record("a", "1", (2023, 1, 1));
    let b = record("b", "2", (2023, 1, 2));
    let mut set = RecordSet::from_records(vec![a.clone(), b.clone()]);
    let mut refreshed = a.clone();
    refreshed.content = "new".to_string();
    set.upsert(refreshed);

    let titles: Vec<_> = set.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["a", "b"]);
}

#[test]
fn from_records_collapses_duplicate_ids() {
    let a = record("a", "1", (2023, 1, 1));
    let set = RecordSet::from_records(vec![a.clone(), a.clone(), a]);
    assert_eq!(set.len(), 1);
}

#[test]
fn recent_orders_by_publish_date_descending() {
    let records = vec![
        record("third", "3", (2023, 1, 3)),
        record("first", "1", (2023, 1, 1)),
        record("second", "2", (2023, 1, 2)),
    ];
    let titles: Vec<_> = most_recent(&records, 3)
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
}

#[test]
fn recent_truncates_and_handles_zero() {
    let set = RecordSet::from_records(vec![
        record("a", "1", (2023, 1, 1)),
        record("b", "2", (2023, 1, 2)),
    ]);
    assert!(set.recent(0).is_empty());
    assert_eq!(set.recent(1).len(), 1);
    assert_eq!(set.recent(1)[0].title, "b");
    assert_eq!(set.recent(50).len(), 2);
}

#[test]
fn recent_ties_keep_insertion_order() {
    let set = RecordSet::from_records(vec![
        record("x", "1", (2023, 1, 1)),
        record("y", "2", (2023, 1, 1)),
    ]);
    let titles: Vec<_> = set.recent(2).into_iter().map(|r| r.title).collect();
    assert_eq!(titles, vec!["x", "y"]);
}

#[test]
fn freshness_respects_ttl() {
    let ttl = TimeDelta::hours(12);
    let mut young = record("young", "1", (2023, 1, 1));
    young.fetched_at = now() - TimeDelta::hours(11);
    let mut old = record("old", "1", (2023, 1, 1));
    old.fetched_at = now() - TimeDelta::hours(13);
    let mut exact = record("exact", "1", (2023, 1, 1));
    exact.fetched_at = now() - ttl;

    assert_eq!(assess_freshness(None, now(), ttl), Freshness::Missing);
    assert_eq!(assess_freshness(Some(&young), now(), ttl), Freshness::Fresh);
    assert_eq!(assess_freshness(Some(&old), now(), ttl), Freshness::Stale);
    assert_eq!(assess_freshness(Some(&exact), now(), ttl), Freshness::Stale);
    assert!(!Freshness::Fresh.needs_fetch());
    assert!(Freshness::Stale.needs_fetch());
}

#[test]
fn record_serializes_every_field_in_camel_case() {
    let rec = record("a", "1", (2023, 1, 1));
    let value = serde_json::to_value(&rec).unwrap();
    let object = value.as_object().unwrap();
    for key in [
        "id",
        "fetchedAt",
        "publishedAt",
        "title",
        "excerpt",
        "url",
        "imageUrl",
        "content",
    ] {
        assert!(object.contains_key(key), "missing {key}");
    }
    assert_eq!(object["content"], "");
}
