use crate::core::auditor::ecm_generator;
use crate::core::auditor::record::{AuditBuildingInfo, AuditId, AuditRecord};
use crate::errors::AuditError;
use crate::input::from_json_str;
use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};
use uuid::Uuid;

/// Locally held audit records, keyed by id and kept in creation order.
///
/// Records are replaced wholesale on every change; nothing hands out mutable access to a stored
/// record.
#[derive(Clone, Debug, Default)]
pub struct AuditStore {
    records: IndexMap<AuditId, AuditRecord>,
}

impl AuditStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&mut self, record: AuditRecord) -> &AuditRecord {
        let id = record.id;
        self.records.insert(id, record);
        &self.records[&id]
    }

    pub fn create(&mut self, name: &str, building: AuditBuildingInfo) -> &AuditRecord {
        let record = AuditRecord::new(name, building, Utc::now());
        info!("Created audit {} ({})", record.name, record.id);
        self.insert(record)
    }

    pub fn get(&self, id: AuditId) -> Result<&AuditRecord, AuditError> {
        self.records.get(&id).ok_or(AuditError::RecordNotFound(id))
    }

    pub fn list(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.values()
    }

    /// Replaces the stored snapshot with the same id.
    pub fn update(&mut self, record: AuditRecord) -> Result<&AuditRecord, AuditError> {
        self.get(record.id)?;
        Ok(self.insert(AuditRecord {
            updated_at: Utc::now(),
            ..record
        }))
    }

    pub fn delete(&mut self, id: AuditId) -> Result<AuditRecord, AuditError> {
        let record = self
            .records
            .shift_remove(&id)
            .ok_or(AuditError::RecordNotFound(id))?;
        info!("Deleted audit {id}");
        Ok(record)
    }

    fn derive(
        &mut self,
        id: AuditId,
        derivation: impl Fn(&AuditRecord) -> AuditRecord,
    ) -> Result<&AuditRecord, AuditError> {
        let derived = derivation(self.get(id)?);
        debug!("Audit {id} produced snapshot {}", derived.id);
        Ok(self.insert(derived))
    }

    pub fn duplicate(&mut self, id: AuditId) -> Result<&AuditRecord, AuditError> {
        self.derive(id, |record| record.duplicate(Utc::now()))
    }

    pub fn reset(&mut self, id: AuditId) -> Result<&AuditRecord, AuditError> {
        self.derive(id, |record| record.reset(Utc::now()))
    }

    pub fn derive_post_installation(&mut self, id: AuditId) -> Result<&AuditRecord, AuditError> {
        self.derive(id, |record| record.derive_post_installation(Utc::now()))
    }

    /// Regenerates the recommendations for a stored audit from its current contents.
    pub fn generate_ecms(&mut self, id: AuditId) -> Result<&AuditRecord, AuditError> {
        self.derive(id, |record| {
            record.with_generated_ecms(ecm_generator::generate(record), Utc::now())
        })
    }

    pub fn export_json(&self, id: AuditId) -> Result<String, AuditError> {
        let record = self.get(id)?;
        serde_json::to_string_pretty(record).map_err(|err| AuditError::InvalidInput(err.into()))
    }

    /// Imports an exported record. The document is kept as it is apart from its id, which is
    /// always fresh so an import never overwrites an existing audit.
    pub fn import_json(&mut self, json: &str) -> Result<&AuditRecord, AuditError> {
        let record: AuditRecord = from_json_str(json)?;
        let record = AuditRecord {
            id: Uuid::new_v4(),
            ..record
        };
        info!("Imported audit {} as {}", record.name, record.id);
        Ok(self.insert(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auditor::record::{Finding, FindingCategory};
    use crate::input::BusinessType;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn building() -> AuditBuildingInfo {
        AuditBuildingInfo {
            business_name: "Main Street Hardware".to_string(),
            business_type: Some(BusinessType::Retail),
            floor_area_sq_ft: Some(8_000.),
            ..Default::default()
        }
    }

    #[rstest]
    fn test_create_get_list(building: AuditBuildingInfo) {
        let mut store = AuditStore::new();
        let first = store.create("First visit", building.clone()).id;
        let second = store.create("Second visit", building).id;

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(first).unwrap().name, "First visit");
        let names = store.list().map(|record| record.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["First visit", "Second visit"]);
        assert_ne!(first, second);
    }

    #[rstest]
    fn test_missing_record(building: AuditBuildingInfo) {
        let mut store = AuditStore::new();
        let id = store.create("Visit", building).id;
        store.delete(id).unwrap();

        assert!(store.is_empty());
        assert!(matches!(store.get(id), Err(AuditError::RecordNotFound(missing)) if missing == id));
        assert!(matches!(store.delete(id), Err(AuditError::RecordNotFound(_))));
        assert!(matches!(store.duplicate(id), Err(AuditError::RecordNotFound(_))));
    }

    #[rstest]
    fn test_update_replaces_snapshot(building: AuditBuildingInfo) {
        let mut store = AuditStore::new();
        let record = store.create("Visit", building).clone();
        let edited = record.with_finding(
            Finding::new(FindingCategory::Lighting, "Display cases lit 24/7"),
            record.updated_at,
        );

        store.update(edited).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(record.id).unwrap().findings.len(), 1);

        let stranger = AuditRecord::new("Unknown", AuditBuildingInfo::default(), Utc::now());
        assert!(store.update(stranger).is_err());
    }

    #[rstest]
    fn test_duplicate_and_post_installation(building: AuditBuildingInfo) {
        let mut store = AuditStore::new();
        let id = store.create("Visit", building).id;

        let copy_id = store.duplicate(id).unwrap().id;
        let post = store.derive_post_installation(id).unwrap().clone();

        assert_eq!(store.len(), 3);
        assert_ne!(copy_id, id);
        assert_eq!(post.derived_from, Some(id));
        assert_eq!(post.building, store.get(id).unwrap().building);
    }

    #[rstest]
    fn test_export_import_assigns_fresh_id(building: AuditBuildingInfo) {
        let mut store = AuditStore::new();
        let id = store.create("Visit", building).id;
        let json = store.export_json(id).unwrap();

        let imported = store.import_json(&json).unwrap().clone();
        let original = store.get(id).unwrap();
        assert_ne!(imported.id, id);
        assert_eq!(AuditRecord { id, ..imported }, *original);
        assert_eq!(store.len(), 2);
    }

    #[rstest]
    fn test_import_rejects_malformed_documents() {
        let mut store = AuditStore::new();
        assert!(matches!(
            store.import_json("{\"name\": \"missing everything\"}"),
            Err(AuditError::InvalidInput(_))
        ));
    }

    #[rstest]
    fn test_generate_and_reset(building: AuditBuildingInfo) {
        let mut store = AuditStore::new();
        let id = store.create("Visit", building).id;

        // retail benchmark HVAC cost makes the thermostat measure worthwhile
        let with_ecms = store.generate_ecms(id).unwrap();
        assert_eq!(with_ecms.id, id);
        assert_eq!(with_ecms.generated_ecms.len(), 1);

        let reset = store.reset(id).unwrap();
        assert!(reset.generated_ecms.is_empty());
        assert_eq!(reset.building, AuditBuildingInfo::default());
    }
}
