//! Integration tests for ferry-catalog
//!
//! These exercise the MetadataStore contract end to end on an in-memory database.

use ferry_catalog::registration::{attach_schema, register_file, register_folder};
use ferry_catalog::{SqliteCatalog, StoreError};
use ferry_domain::names::{classifications, properties, relationships, types};
use ferry_domain::{Direction, ElementId, MetadataStore, ParentLink};
use std::collections::BTreeMap;
use std::path::Path;

fn props(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_catalog_initialization() {
    let catalog = SqliteCatalog::new(":memory:");
    assert!(catalog.is_ok(), "Catalog should initialize successfully");
}

#[test]
fn test_catalog_reopens_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("catalog.db");

    let id = {
        let catalog = SqliteCatalog::new(&db).unwrap();
        catalog
            .create_element(types::PROCESS, &props(&[("qualifiedName", "p")]), None)
            .unwrap()
    };

    let catalog = SqliteCatalog::new(&db).unwrap();
    assert_eq!(
        catalog.get_element_by_unique_name("p", properties::QUALIFIED_NAME).unwrap(),
        Some(id)
    );
}

#[test]
fn test_create_and_get_element() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let id = catalog
        .create_element(
            types::CSV_FILE,
            &props(&[("qualifiedName", "CSVFile:/in/a.csv"), ("pathName", "/in/a.csv")]),
            None,
        )
        .unwrap();

    let element = catalog.get_element(id).unwrap().expect("element should exist");
    assert_eq!(element.type_name, types::CSV_FILE);
    assert_eq!(element.property(properties::PATH_NAME), Some("/in/a.csv"));
    assert_eq!(
        catalog.get_element_property(id, properties::QUALIFIED_NAME).unwrap().as_deref(),
        Some("CSVFile:/in/a.csv")
    );
    assert!(catalog.get_element(ElementId::new()).unwrap().is_none());
}

#[test]
fn test_unique_name_lookup_uses_property_key() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let id = catalog
        .create_element(types::FILE_FOLDER, &props(&[("name", "out"), ("pathName", "/out")]), None)
        .unwrap();

    assert_eq!(catalog.get_element_by_unique_name("/out", properties::PATH_NAME).unwrap(), Some(id));
    assert_eq!(catalog.get_element_by_unique_name("/out", properties::NAME).unwrap(), None);
    assert_eq!(catalog.get_element_by_unique_name("out", properties::NAME).unwrap(), Some(id));
}

#[test]
fn test_create_relationship_is_idempotent() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let a = catalog.create_element(types::CSV_FILE, &BTreeMap::new(), None).unwrap();
    let b = catalog.create_element(types::PROCESS, &BTreeMap::new(), None).unwrap();

    let first = catalog
        .create_relationship(relationships::DATA_FLOW, a, b, &BTreeMap::new())
        .unwrap();
    let second = catalog
        .create_relationship(relationships::DATA_FLOW, a, b, &BTreeMap::new())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(catalog.count_relationships(relationships::DATA_FLOW).unwrap(), 1);

    // Reverse direction is a different relationship
    catalog
        .create_relationship(relationships::DATA_FLOW, b, a, &BTreeMap::new())
        .unwrap();
    assert_eq!(catalog.count_relationships(relationships::DATA_FLOW).unwrap(), 2);
}

#[test]
fn test_relationship_to_missing_element_fails() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let a = catalog.create_element(types::CSV_FILE, &BTreeMap::new(), None).unwrap();

    let result = catalog.create_relationship(relationships::DATA_FLOW, a, ElementId::new(), &BTreeMap::new());
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_related_elements_by_direction_and_page() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let folder = catalog.create_element(types::FILE_FOLDER, &BTreeMap::new(), None).unwrap();
    let link = ParentLink::new(folder, relationships::NESTED_FILE);

    let files: Vec<ElementId> = (0..5)
        .map(|i| {
            catalog
                .create_element(types::CSV_FILE, &props(&[("name", format!("f{}", i).as_str())]), Some(&link))
                .unwrap()
        })
        .collect();

    let first_page = catalog
        .get_related_elements(folder, Direction::Outbound, relationships::NESTED_FILE, 0, 2)
        .unwrap();
    let second_page = catalog
        .get_related_elements(folder, Direction::Outbound, relationships::NESTED_FILE, 2, 2)
        .unwrap();
    let last_page = catalog
        .get_related_elements(folder, Direction::Outbound, relationships::NESTED_FILE, 4, 2)
        .unwrap();

    let paged: Vec<ElementId> = first_page
        .iter()
        .chain(&second_page)
        .chain(&last_page)
        .map(|r| r.element.id)
        .collect();
    assert_eq!(paged, files, "paging should follow creation order");
    assert_eq!(last_page.len(), 1);

    let parents = catalog
        .get_related_elements(files[3], Direction::Inbound, relationships::NESTED_FILE, 0, 10)
        .unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].element.id, folder);
    assert_eq!(parents[0].relationship_type, relationships::NESTED_FILE);

    let none = catalog
        .get_related_elements(files[0], Direction::Outbound, relationships::NESTED_FILE, 0, 10)
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_create_from_template() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();

    let connector = catalog.create_element(types::CONNECTION, &BTreeMap::new(), None).unwrap();
    let template_folder = catalog.create_element(types::FILE_FOLDER, &BTreeMap::new(), None).unwrap();
    let template = catalog
        .create_element(
            types::CSV_FILE,
            &props(&[
                ("qualifiedName", "CSVFile:~{pathName}~"),
                ("description", "Landed ~{fileName}~ at ~{createTime}~"),
                ("owner", "data-team"),
            ]),
            Some(&ParentLink::new(template_folder, relationships::NESTED_FILE)),
        )
        .unwrap();
    catalog.classify_element(template, classifications::TEMPLATE).unwrap();
    catalog.classify_element(template, "Confidentiality").unwrap();
    catalog
        .create_relationship("SupportedBy", template, connector, &props(&[("role", "reader")]))
        .unwrap();

    let destination_folder = catalog.create_element(types::FILE_FOLDER, &BTreeMap::new(), None).unwrap();
    let id = catalog
        .create_element_from_template(
            template,
            &props(&[("pathName", "/out/a.csv"), ("fileName", "a.csv")]),
            &props(&[("displayName", "a.csv")]),
            Some(&ParentLink::new(destination_folder, relationships::NESTED_FILE)),
        )
        .unwrap();

    let element = catalog.get_element(id).unwrap().unwrap();
    assert_eq!(element.type_name, types::CSV_FILE);
    assert_eq!(element.property("qualifiedName"), Some("CSVFile:/out/a.csv"));
    assert_eq!(element.property("description"), Some("Landed a.csv at "));
    assert_eq!(element.property("owner"), Some("data-team"));
    assert_eq!(element.property("displayName"), Some("a.csv"));
    assert!(element.is_classified("Confidentiality"));
    assert!(!element.is_classified(classifications::TEMPLATE));

    let supported = catalog
        .get_related_elements(id, Direction::Outbound, "SupportedBy", 0, 10)
        .unwrap();
    assert_eq!(supported.len(), 1);
    assert_eq!(supported[0].element.id, connector);
    assert_eq!(supported[0].relationship_properties.get("role").map(String::as_str), Some("reader"));

    let parents = catalog
        .get_related_elements(id, Direction::Inbound, relationships::NESTED_FILE, 0, 10)
        .unwrap();
    assert_eq!(parents.len(), 1);
    assert_eq!(parents[0].element.id, destination_folder, "template's folder is not copied");
}

#[test]
fn test_template_not_found() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let result = catalog.create_element_from_template(
        ElementId::new(),
        &BTreeMap::new(),
        &BTreeMap::new(),
        None,
    );
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}

#[test]
fn test_register_file_nests_under_folder() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let file = register_file(&catalog, Path::new("/in/report.csv")).unwrap();

    let again = register_file(&catalog, Path::new("/in/report.csv")).unwrap();
    assert_eq!(file, again, "registration should reuse existing entries");

    let element = catalog.get_element(file).unwrap().unwrap();
    assert_eq!(element.type_name, types::CSV_FILE);
    assert_eq!(element.property(properties::QUALIFIED_NAME), Some("CSVFile:/in/report.csv"));
    assert_eq!(element.property(properties::FILE_EXTENSION), Some("csv"));

    let folder = register_folder(&catalog, Path::new("/in")).unwrap();
    let parents = catalog
        .get_related_elements(file, Direction::Inbound, relationships::NESTED_FILE, 0, 10)
        .unwrap();
    assert_eq!(parents[0].element.id, folder);
}

#[test]
fn test_attach_schema_positions() {
    let catalog = SqliteCatalog::new(":memory:").unwrap();
    let file = register_file(&catalog, Path::new("/in/report.csv")).unwrap();
    let schema = attach_schema(&catalog, file, &["A", "B", "C"]).unwrap();

    let attributes = catalog
        .get_related_elements(schema, Direction::Outbound, relationships::ATTRIBUTE_FOR_SCHEMA, 0, 10)
        .unwrap();
    let described: Vec<(String, String)> = attributes
        .iter()
        .map(|a| {
            (
                a.element.property(properties::NAME).unwrap().to_string(),
                a.element.property(properties::POSITION).unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        described,
        vec![
            ("A".to_string(), "0".to_string()),
            ("B".to_string(), "1".to_string()),
            ("C".to_string(), "2".to_string()),
        ]
    );
}
