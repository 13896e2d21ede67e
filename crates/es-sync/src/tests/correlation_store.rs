use crate::{CorrelationStore, FileCorrelationStore, MemoryCorrelationStore};

use googletest::prelude::*;
use tempfile::TempDir;

#[test]
fn given_saved_token_when_taken_twice_then_second_is_none() {
    // Given
    let dir = TempDir::new().unwrap();
    let store = FileCorrelationStore::new(dir.path());
    store.save("abc").unwrap();

    // When
    let first = store.take().unwrap();
    let second = store.take().unwrap();

    // Then
    assert_that!(first.as_deref(), some(eq("abc")));
    assert_that!(second, none());
    assert!(!store.path().exists());
}

#[test]
fn given_existing_token_when_saved_then_replaced_without_leftovers() {
    let dir = TempDir::new().unwrap();
    let store = FileCorrelationStore::new(dir.path());

    store.save("old").unwrap();
    store.save("new").unwrap();

    assert_that!(store.take().unwrap().as_deref(), some(eq("new")));
    assert!(!store.path().with_extension("tmp").exists());
}

#[test]
fn given_missing_directory_when_saved_then_created() {
    let dir = TempDir::new().unwrap();
    let store = FileCorrelationStore::new(dir.path().join("nested"));

    store.save("abc").unwrap();

    assert!(store.path().exists());
}

#[test]
fn given_nothing_saved_when_taken_then_none() {
    let dir = TempDir::new().unwrap();

    assert_that!(FileCorrelationStore::new(dir.path()).take().unwrap(), none());
    assert_that!(MemoryCorrelationStore::new().take().unwrap(), none());
}
