//! Host sink persistence properties

mod common;

use common::{lines_of, FixedAnswer};
use hostgather::config::{NonInteractivePolicy, SaveMode};
use hostgather::sink::{write_hosts, HostSet, HostSink, HostStore};
use hostgather::utils::{ModeChoice, PolicyPrompter};
use proptest::prelude::*;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn ipv4() -> impl Strategy<Value = String> {
    (1u8..=254, any::<u8>(), any::<u8>(), 1u8..=254)
        .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d))
}

fn host_set() -> impl Strategy<Value = HostSet> {
    prop::collection::btree_set(ipv4(), 0..40)
}

proptest! {
    #[test]
    fn overwrite_leaves_exactly_the_set(old in host_set(), new in host_set()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts.txt");
        let prompter = FixedAnswer::new(ModeChoice::Append);
        write_hosts(&old, &path, None, &prompter).unwrap();

        let outcome = write_hosts(&new, &path, Some(SaveMode::Overwrite), &prompter).unwrap();

        prop_assert!(outcome.saved);
        prop_assert_eq!(outcome.written, new.len());
        let on_disk: Vec<String> = lines_of(&path);
        prop_assert_eq!(on_disk, new.into_iter().collect::<Vec<_>>());
        // explicit mode, nobody asked
        prop_assert_eq!(prompter.times_asked(), 0);
    }

    #[test]
    fn append_keeps_old_lines_first(old in host_set(), new in host_set()) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hosts.txt");
        let prompter = FixedAnswer::new(ModeChoice::Append);
        write_hosts(&old, &path, None, &prompter).unwrap();

        write_hosts(&new, &path, None, &prompter).unwrap();

        let mut expected: Vec<String> = old.into_iter().collect();
        expected.extend(new);
        prop_assert_eq!(lines_of(&path), expected);
    }
}

#[test]
fn test_invalid_answer_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts.txt");
    fs::write(&path, "1.1.1.1\n").unwrap();
    let prompter = Arc::new(FixedAnswer::new(ModeChoice::Invalid("x".into())));
    let sink = HostSink::new(&path, prompter.clone());

    let hosts: HostSet = ["2.2.2.2".to_string()].into_iter().collect();
    let outcome = sink.persist(&hosts, None).unwrap();

    assert!(!outcome.saved);
    assert_eq!(outcome.mode, SaveMode::Append);
    assert_eq!(outcome.written, 0);
    assert_eq!(prompter.times_asked(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), "1.1.1.1\n");
}

#[test]
fn test_policy_prompter_overwrites_without_asking_anyone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts.txt");
    fs::write(&path, "1.1.1.1\n").unwrap();
    let policy = NonInteractivePolicy {
        enabled: true,
        save_mode: SaveMode::Overwrite,
        ..Default::default()
    };
    let sink = HostSink::new(&path, Arc::new(PolicyPrompter::new(policy)));

    let hosts: HostSet = ["3.3.3.3".to_string()].into_iter().collect();
    let outcome = sink.persist(&hosts, None).unwrap();

    assert_eq!(outcome.mode, SaveMode::Overwrite);
    assert_eq!(lines_of(&path), vec!["3.3.3.3"]);
}

#[test]
fn test_progress_stopped_before_prompting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts.txt");
    let token = CancellationToken::new();
    let sink = HostSink::new(&path, Arc::new(FixedAnswer::new(ModeChoice::Append)))
        .with_progress(token.clone());
    let hosts: HostSet = ["4.4.4.4".to_string()].into_iter().collect();

    // first write creates the file, no question asked
    sink.persist(&hosts, None).unwrap();
    assert!(!token.is_cancelled());

    sink.persist(&hosts, None).unwrap();
    assert!(token.is_cancelled());
    assert_eq!(lines_of(&path), vec!["4.4.4.4", "4.4.4.4"]);
}

#[test]
fn test_store_round_trip_through_sink() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts.txt");
    let sink = HostSink::new(&path, Arc::new(FixedAnswer::new(ModeChoice::Append)));
    let store = HostStore::new(&path);

    let hosts: HostSet = ["5.5.5.5".to_string(), "6.6.6.6".to_string()]
        .into_iter()
        .collect();
    sink.persist(&hosts, None).unwrap();
    sink.persist(&hosts, None).unwrap();

    assert_eq!(store.load().unwrap().len(), 4);
    assert_eq!(store.clean().unwrap(), 2);
    assert_eq!(store.load().unwrap(), vec!["5.5.5.5", "6.6.6.6"]);

    let report = store.add_single("7.7.7.7, 127.0.0.1, nope", false).unwrap();
    assert_eq!(report.added, vec!["7.7.7.7"]);
    assert_eq!(report.rejected, vec!["127.0.0.1", "nope"]);

    let backup = store.backup(&dir.path().join("backups")).unwrap();
    assert_eq!(lines_of(&backup), vec!["5.5.5.5", "6.6.6.6", "7.7.7.7"]);
}
