//! Concurrent dispensation recording against a file-backed database.

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::Utc;
use medstock_core::models::{HighCostMedication, LinkStatus, Patient, PatientMedicationLink};
use medstock_core::{Database, DbError};
use tempfile::TempDir;

const WRITERS: usize = 8;

fn setup() -> (TempDir, std::path::PathBuf, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("medstock.db");

    let db = Database::open(&path).unwrap();
    let patient = Patient::new("Ana Lima".into(), "898 0010 2345 6789".into());
    let medication = HighCostMedication::new("Adalimumabe 40mg".into(), None);
    db.insert_patient(&patient).unwrap();
    db.upsert_medication(&medication).unwrap();

    let link = PatientMedicationLink::new(patient.id, medication.id);
    db.insert_link(&link).unwrap();
    db.set_link_status(&link.id, LinkStatus::Available).unwrap();

    (dir, path, link.id)
}

#[test]
fn test_concurrent_dispensations_are_all_counted() {
    let (_dir, path, link_id) = setup();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let path = path.clone();
            let link_id = link_id.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                // Each staff session has its own connection
                let db = Database::open(&path).unwrap();
                barrier.wait();
                db.record_dispensation(&link_id, Utc::now(), Some(format!("terminal {i}")))
                    .unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let db = Database::open(&path).unwrap();
    let link = db.get_link(&link_id).unwrap().unwrap();
    assert_eq!(link.dispensations_performed as usize, WRITERS);
    assert_eq!(link.status, LinkStatus::Awaiting);
    assert_eq!(db.list_dispensations(&link_id).unwrap().len(), WRITERS);
}

#[test]
fn test_out_of_stock_blocks_every_writer() {
    let (_dir, path, link_id) = setup();
    Database::open(&path)
        .unwrap()
        .set_link_status(&link_id, LinkStatus::OutOfStock)
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let link_id = link_id.clone();
            thread::spawn(move || {
                let db = Database::open(&path).unwrap();
                db.record_dispensation(&link_id, Utc::now(), None)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().unwrap();
        assert!(matches!(result, Err(DbError::DeliveryDisabled(_))));
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.get_link(&link_id).unwrap().unwrap().dispensations_performed, 0);
}
