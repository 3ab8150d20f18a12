//! Payload mapping across realistic entity shapes.

use std::sync::Arc;

use erpsync_core::mapping::WIRE_FIELDS;
use erpsync_core::{MunicipalityTable, PayloadMapper};
use erpsync_domain::{
    AddressDetails, CatalogSelection, CompanyProfile, ConsolidatedBusinessEntity, ContactDetails,
    ErpDefaults, ExplicitOverrides, FormSelections,
};

fn mapper() -> PayloadMapper {
    PayloadMapper::new(
        ErpDefaults::default(),
        Arc::new(MunicipalityTable::new().with_entry("Ribeirão Preto", "SP", "6969")),
    )
}

fn full_entity() -> ConsolidatedBusinessEntity {
    ConsolidatedBusinessEntity {
        company: CompanyProfile {
            tax_id: "11.222.333/0001-81".into(),
            legal_name: " ACME INDUSTRIA LTDA ".into(),
            trade_name: Some("ACME".into()),
            state_registration: Some("123.456.789.110".into()),
            municipal_registration: Some("998877".into()),
            email: Some("fiscal@acme.com.br".into()),
            phone: Some("(16) 3333-4444".into()),
        },
        address: AddressDetails {
            street: Some("Av. Brasil".into()),
            number: Some("100".into()),
            complement: None,
            district: Some("Centro".into()),
            city: Some("RIBEIRAO PRETO".into()),
            state: Some("sp".into()),
            postal_code: Some("14010-000".into()),
        },
        contact: ContactDetails {
            name: Some("Maria".into()),
            email: None,
            phone: Some("16 99999-0000".into()),
        },
        selections: FormSelections {
            type_code: Some("r".into()),
            carrier: Some(CatalogSelection::new(3, "42")),
            price_list: Some(CatalogSelection { id: 4, code: None }),
            ..FormSelections::default()
        },
        overrides: ExplicitOverrides {
            billing_method_code: Some("7".into()),
            ..ExplicitOverrides::default()
        },
    }
}

#[test]
fn every_wire_field_is_present_for_any_entity() {
    let entities = [ConsolidatedBusinessEntity::default(), full_entity()];

    for entity in &entities {
        let wire = mapper().map(entity).to_wire();
        let object = wire.as_object().expect("payload is a JSON object");

        assert_eq!(object.len(), WIRE_FIELDS.len());
        for field in WIRE_FIELDS {
            assert!(object[field].is_string(), "{field} should be a string");
        }
    }
}

#[test]
fn resolution_chain_applies_per_field() {
    let payload = mapper().map(&full_entity());

    assert_eq!(payload.person_type, "J");
    assert_eq!(payload.tax_id, "11222333000181");
    assert_eq!(payload.legal_name, "ACME INDUSTRIA LTDA");
    assert_eq!(payload.type_code, "R");
    assert_eq!(payload.has_state_registration, "1");
    // catalog code, padded
    assert_eq!(payload.carrier_code, "000042");
    // selection without a code falls back to the default
    assert_eq!(payload.price_list_code, ErpDefaults::default().price_list_code);
    // explicit values are sent verbatim
    assert_eq!(payload.billing_method_code, "7");
    assert_eq!(payload.municipality_code, "6969");
    assert_eq!(payload.state, "SP");
    assert_eq!(payload.postal_code, "14010000");
    assert_eq!(payload.contact_email, "fiscal@acme.com.br");
    assert_eq!(payload.contact_phone, "16999990000");
    assert!(payload.validate().is_ok());
}

#[test]
fn individual_without_state_registration_is_exempt() {
    let entity = ConsolidatedBusinessEntity {
        company: CompanyProfile {
            tax_id: "123.456.789-09".into(),
            legal_name: "Joao da Silva".into(),
            state_registration: Some("   ".into()),
            ..CompanyProfile::default()
        },
        ..ConsolidatedBusinessEntity::default()
    };

    let payload = mapper().map(&entity);

    assert_eq!(payload.person_type, "F");
    assert_eq!(payload.has_state_registration, "2");
    assert_eq!(payload.state_registration, "ISENTO");
    assert_eq!(payload.trade_name, "Joao da Silva");
    assert_eq!(payload.municipality_code, "");
}
