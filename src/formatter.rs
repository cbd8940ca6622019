use crate::models::{FormattedSnapshot, FormattedVideo, VideoStatRecord};

/// Flattens fetched records into the persisted snapshot, skipping videos the
/// platform returned nothing for.
pub fn format_snapshot(records: &[Option<VideoStatRecord>]) -> FormattedSnapshot {
    records
        .iter()
        .flatten()
        .map(|record| (record.id.clone(), format_video(record)))
        .collect()
}

fn format_video(record: &VideoStatRecord) -> FormattedVideo {
    FormattedVideo {
        title: record.title.clone(),
        description: record.description.clone(),
        views: record.view_count,
        likes: record.like_count,
        published: record.published_at.clone(),
        thumbnails: record.thumbnails.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::sample_record;

    #[test]
    fn absent_records_are_skipped() {
        let records = vec![Some(sample_record("a")), None, Some(sample_record("b"))];
        let snapshot = format_snapshot(&records);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("a"));
        assert!(snapshot.contains_key("b"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let records = vec![Some(sample_record("z")), Some(sample_record("a"))];
        let first = format_snapshot(&records);
        let second = format_snapshot(&records);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn fields_are_mapped() {
        let mut record = sample_record("abc");
        record.like_count = None;
        let snapshot = format_snapshot(&[Some(record.clone())]);
        let video = &snapshot["abc"];
        assert_eq!(video.title, record.title);
        assert_eq!(video.description, record.description);
        assert_eq!(video.views, Some(1000));
        assert_eq!(video.likes, None);
        assert_eq!(video.published, "2024-05-01T12:00:00Z");
        assert_eq!(video.thumbnails, record.thumbnails);
    }

    #[test]
    fn serialized_entry_uses_snapshot_field_names() {
        let snapshot = format_snapshot(&[Some(sample_record("abc"))]);
        let value = serde_json::to_value(&snapshot).unwrap();
        let entry = value["abc"].as_object().unwrap();
        let mut keys: Vec<_> = entry.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["description", "likes", "published", "thumbnails", "title", "views"]
        );
    }

    #[test]
    fn empty_input_formats_to_empty_snapshot() {
        assert!(format_snapshot(&[]).is_empty());
        assert!(format_snapshot(&[None, None]).is_empty());
    }
}
