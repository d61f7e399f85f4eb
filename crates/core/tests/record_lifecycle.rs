use medrec_core::{
    CommitAction, CorruptionPolicy, DraftSession, FileKeyValueStore, ImageReferencer, KeyValueStore,
    LocalFile, MemoryKeyValueStore, ObjectUrlRegistry, PatientRecord, RecordError, RecordField,
    RecordId, RecordStore, StoreConfig,
};
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;

fn memory_store() -> RecordStore<MemoryKeyValueStore> {
    RecordStore::new(MemoryKeyValueStore::new(), StoreConfig::default())
}

fn commit_patient<S: KeyValueStore>(
    store: &mut RecordStore<S>,
    name: &str,
    diagnoses: Option<&str>,
) -> PatientRecord {
    let mut draft = DraftSession::new();
    draft.start_new();
    draft.set_field(RecordField::Name, name).unwrap();
    draft.set_field(RecordField::Age, "34").unwrap();
    draft.set_field(RecordField::Gender, "F").unwrap();
    if let Some(d) = diagnoses {
        draft.set_field(RecordField::Diagnoses, d).unwrap();
    }
    draft.commit(store).unwrap().record
}

#[test]
fn ana_gripe_walkthrough() {
    let temp = TempDir::new().unwrap();
    let file_a = temp.path().join("rx-a.png");
    fs::write(&file_a, b"\x89PNG\r\n\x1a\n0000").unwrap();

    let mut store = memory_store();
    let mut registry = ObjectUrlRegistry::new();

    let ana = commit_patient(&mut store, "Ana", Some("Gripe"));
    assert_eq!(store.len(), 1);
    assert!(ana.images().is_empty());

    let mut draft = DraftSession::new();
    draft.start_new();
    draft.set_field(RecordField::Name, "Luis").unwrap();
    draft.set_field(RecordField::Age, "61").unwrap();
    draft.set_field(RecordField::Gender, "M").unwrap();
    let attached = draft
        .attach_images(vec![LocalFile::new(&file_a)], &mut registry)
        .unwrap();
    let luis = draft.commit(&mut store).unwrap().record;

    assert_eq!(luis.images(), attached.as_slice());
    assert_eq!(registry.read(&attached[0]).unwrap(), fs::read(&file_a).unwrap());

    let found = store.search("gripe");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), ana.id());

    store.delete(ana.id()).unwrap();
    assert!(store.search("gripe").is_empty());
    assert_eq!(store.list()[0].id(), luis.id());
}

#[test]
fn update_of_missing_id_leaves_store_unchanged() {
    let mut store = memory_store();
    let ana = commit_patient(&mut store, "Ana", Some("Gripe"));
    let before = store.list().to_vec();

    let err = store
        .update(&RecordId::new("no-such-record"), ana.fields().clone())
        .unwrap_err();

    assert!(matches!(err, RecordError::NotFound(_)));
    assert_eq!(store.list(), before.as_slice());
}

#[test]
fn failed_validation_can_be_corrected_and_retried() {
    let mut store = memory_store();
    let mut draft = DraftSession::new();
    draft.start_new();
    draft.set_field(RecordField::Name, "").unwrap();
    draft.set_field(RecordField::Age, "34").unwrap();
    draft.set_field(RecordField::Gender, "F").unwrap();
    draft.set_field(RecordField::Symptoms, "Fiebre").unwrap();

    assert!(matches!(
        draft.commit(&mut store),
        Err(RecordError::Validation { ref missing }) if missing == &[RecordField::Name]
    ));
    assert_eq!(draft.fields().unwrap().symptoms.as_deref(), Some("Fiebre"));

    draft.set_field(RecordField::Name, "Ana").unwrap();
    let result = draft.commit(&mut store).unwrap();

    assert_eq!(result.action, CommitAction::Created);
    assert_eq!(result.record.fields().symptoms.as_deref(), Some("Fiebre"));
}

#[test]
fn ids_stay_unique_and_identity_survives_updates() {
    let mut store = memory_store();
    let records: Vec<PatientRecord> = (0..50)
        .map(|i| commit_patient(&mut store, &format!("Patient {i}"), None))
        .collect();

    let ids: HashSet<&RecordId> = records.iter().map(|r| r.id()).collect();
    assert_eq!(ids.len(), records.len());

    let target = &records[10];
    let mut draft = DraftSession::new();
    for round in 0..5 {
        draft.start_edit(store.get(target.id()).unwrap());
        draft
            .set_field(RecordField::Notes, format!("visit {round}"))
            .unwrap();
        let updated = draft.commit(&mut store).unwrap().record;

        assert_eq!(updated.id(), target.id());
        assert_eq!(updated.created_at(), target.created_at());
    }
}

#[test]
fn search_matches_list_semantics() {
    let mut store = memory_store();
    commit_patient(&mut store, "Ana", Some("Gripe"));
    commit_patient(&mut store, "Luis", Some("GRIPE aviar"));
    commit_patient(&mut store, "Eva", None);

    let everything: Vec<&PatientRecord> = store.search("");
    assert_eq!(everything.len(), store.len());
    for (found, listed) in everything.iter().zip(store.list()) {
        assert_eq!(*found, listed);
    }

    let names: Vec<&str> = store.search("Gripe").into_iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["Luis", "Ana"]);
    assert_eq!(store.search("eva").len(), 1);
}

#[test]
fn delete_twice_is_harmless() {
    let mut store = memory_store();
    let ana = commit_patient(&mut store, "Ana", None);
    commit_patient(&mut store, "Luis", None);

    assert!(store.delete(ana.id()).unwrap());
    let after_first = store.list().to_vec();
    assert!(!store.delete(ana.id()).unwrap());

    assert_eq!(store.list(), after_first.as_slice());
}

#[test]
fn records_survive_reopening_a_data_directory() {
    let temp = TempDir::new().unwrap();
    let written = {
        let substrate = FileKeyValueStore::open(temp.path()).unwrap();
        let (mut store, _) = RecordStore::open(substrate, StoreConfig::default()).unwrap();
        commit_patient(&mut store, "Ana", Some("Gripe"));

        let mut draft = DraftSession::new();
        draft.start_new();
        draft.set_field(RecordField::Name, "Luis").unwrap();
        draft.set_field(RecordField::Age, "61").unwrap();
        draft.set_field(RecordField::Gender, "M").unwrap();
        draft
            .set_field(RecordField::Notes, "línea 1\n\"línea\" 2")
            .unwrap();
        draft.set_field(RecordField::Treatments, "").unwrap();
        draft.commit(&mut store).unwrap();

        store.list().to_vec()
    };

    let substrate = FileKeyValueStore::open(temp.path()).unwrap();
    let (store, report) = RecordStore::open(substrate, StoreConfig::default()).unwrap();

    assert_eq!(report.loaded, 2);
    assert_eq!(store.list(), written.as_slice());
    assert!(temp.path().join("patientRecords").is_file());
}

#[test]
fn legacy_browser_data_loads_and_is_rewritten() {
    let legacy = r#"[
        {"id":"1718000000001","name":"Luis","age":"61","gender":"M","historialClinico":"","antecedentes":"HTA","sintomas":"Cefalea","diagnosticos":"Migraña","tratamientos":"","notas":"","images":["blob:http://localhost:3000/6f1c"],"createdAt":"2024-06-10T09:31:00.000Z"},
        {"id":"1718000000000","name":"Ana","age":"34","gender":"F","diagnosticos":"Gripe","createdAt":"2024-06-10T09:30:00.000Z"}
    ]"#;
    let substrate = MemoryKeyValueStore::new().with_entry("patientRecords", legacy);

    let (mut store, report) = RecordStore::open(substrate, StoreConfig::default()).unwrap();

    assert_eq!(report.loaded, 2);
    assert!(report.reassigned_ids.is_empty());
    assert_eq!(store.search("migraña")[0].name(), "Luis");
    assert!(store.list()[1].images().is_empty());

    let registry = ObjectUrlRegistry::new();
    assert!(registry.resolve(&store.list()[0].images()[0]).is_none());

    store.save().unwrap();
    let saved = store.substrate().get("patientRecords").unwrap().unwrap();
    assert!(saved.contains("\"diagnoses\":\"Migraña\""));
    assert!(!saved.contains("diagnosticos"));
}

#[test]
fn corrupt_data_policies() {
    let strict = StoreConfig::new("patientRecords", CorruptionPolicy::Fail).unwrap();
    let substrate = MemoryKeyValueStore::new().with_entry("patientRecords", "not json at all");
    assert!(matches!(
        RecordStore::open(substrate.clone(), strict),
        Err(RecordError::PersistenceCorruption(_))
    ));

    let (mut store, report) = RecordStore::open(substrate, StoreConfig::default()).unwrap();
    assert!(report.recovered_from_corruption);
    assert!(store.is_empty());

    commit_patient(&mut store, "Ana", None);
    assert_eq!(
        store
            .substrate()
            .get("patientRecords.corrupt")
            .unwrap()
            .as_deref(),
        Some("not json at all")
    );
}

#[test]
fn rejected_write_keeps_change_until_retried() {
    let mut store = memory_store();
    store.substrate_mut().set_reject_writes(true);

    let mut draft = DraftSession::new();
    draft.start_new();
    draft.set_field(RecordField::Name, "Ana").unwrap();
    draft.set_field(RecordField::Age, "34").unwrap();
    draft.set_field(RecordField::Gender, "F").unwrap();

    assert!(matches!(
        draft.commit(&mut store),
        Err(RecordError::Unsaved { id: Some(_), .. })
    ));
    assert_eq!(store.len(), 1);

    store.substrate_mut().set_reject_writes(false);
    store.save().unwrap();

    let (reloaded, _) =
        RecordStore::open(store.substrate().clone(), StoreConfig::default()).unwrap();
    assert_eq!(reloaded.list(), store.list());
}

#[test]
fn discarded_drafts_hand_back_their_references() {
    let mut store = memory_store();
    let mut registry = ObjectUrlRegistry::new();
    let ana = commit_patient(&mut store, "Ana", None);

    let mut draft = DraftSession::new();
    draft.start_edit(&ana);
    draft.set_field(RecordField::Name, "Changed").unwrap();
    let scan = registry.reference_for(&LocalFile::new("/tmp/scan.png"));
    let attached = draft
        .attach_images(vec![LocalFile::new("/tmp/a.png"), LocalFile::new("/tmp/b.png")], &mut registry)
        .unwrap();
    assert_eq!(registry.len(), 3);

    let orphaned = draft.discard();
    assert_eq!(orphaned, attached);
    assert_eq!(registry.revoke_all(&orphaned), 2);
    assert!(registry.resolve(&scan).is_some());

    assert_eq!(store.get(ana.id()).unwrap(), &ana);
}
