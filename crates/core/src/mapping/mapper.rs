//! Consolidated entity → ERP customer payload.

use std::sync::Arc;

use erpsync_domain::constants::{
    ACTIVITY_BRANCH_CODE_WIDTH, BILLING_METHOD_CODE_WIDTH, CARRIER_CODE_WIDTH,
    PAYMENT_CONDITION_CODE_WIDTH, PERSON_INDIVIDUAL, PERSON_ORGANIZATION, PRICE_LIST_CODE_WIDTH,
    STATE_REGISTRATION_ABSENT, STATE_REGISTRATION_EXEMPT, STATE_REGISTRATION_PRESENT,
};
use erpsync_domain::{
    normalize_tax_id, CatalogSelection, ConsolidatedBusinessEntity, ErpDefaults, TaxIdKind,
};

use super::municipality::MunicipalityTable;
use super::payload::CustomerPayload;
use super::resolve::resolve_code;
use crate::erp_ports::MunicipalityResolver;

/// Builds the customer-creation payload. Pure: no I/O besides the injected
/// municipality lookup, and every wire field is always filled.
#[derive(Clone)]
pub struct PayloadMapper {
    defaults: ErpDefaults,
    municipalities: Arc<dyn MunicipalityResolver>,
}

impl std::fmt::Debug for PayloadMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadMapper").field("defaults", &self.defaults).finish_non_exhaustive()
    }
}

impl PayloadMapper {
    pub fn new(defaults: ErpDefaults, municipalities: Arc<dyn MunicipalityResolver>) -> Self {
        Self { defaults, municipalities }
    }

    /// Mapper with an empty municipality table.
    pub fn with_defaults(defaults: ErpDefaults) -> Self {
        Self::new(defaults, Arc::new(MunicipalityTable::new()))
    }

    pub fn defaults(&self) -> &ErpDefaults {
        &self.defaults
    }

    pub fn map(&self, entity: &ConsolidatedBusinessEntity) -> CustomerPayload {
        let company = &entity.company;
        let address = &entity.address;
        let contact = &entity.contact;
        let selections = &entity.selections;
        let overrides = &entity.overrides;
        let defaults = &self.defaults;

        let tax_id = normalize_tax_id(&company.tax_id);
        let person_type = match TaxIdKind::from_digits(&tax_id) {
            TaxIdKind::Individual => PERSON_INDIVIDUAL,
            TaxIdKind::Organization => PERSON_ORGANIZATION,
        };

        let legal_name = company.legal_name.trim().to_string();
        let trade_name = text(&company.trade_name);
        let trade_name = if trade_name.is_empty() { legal_name.clone() } else { trade_name };

        let state_registration = text(&company.state_registration);
        let (state_registration, has_state_registration) = if state_registration.is_empty() {
            (STATE_REGISTRATION_EXEMPT.to_string(), STATE_REGISTRATION_ABSENT)
        } else {
            (state_registration, STATE_REGISTRATION_PRESENT)
        };

        let city = text(&address.city);
        let state = text(&address.state).to_uppercase();
        let municipality_code = match non_blank(&overrides.municipality_code) {
            Some(code) => code.to_string(),
            None if !city.is_empty() => self.municipalities.resolve(&city, &state).unwrap_or_default(),
            None => String::new(),
        };

        let type_code = resolve_code(
            overrides.type_code.as_deref(),
            selections.type_code.as_deref(),
            &defaults.type_code,
            None,
        )
        .value
        .to_uppercase();

        let catalog = |explicit: &Option<String>,
                       selection: &Option<CatalogSelection>,
                       default: &str,
                       width: usize| {
            resolve_code(
                explicit.as_deref(),
                selection.as_ref().and_then(|s| s.code.as_deref()),
                default,
                Some(width),
            )
            .value
        };

        let email = text(&company.email);
        let phone = digits(&company.phone);
        let contact_email = or_fallback(text(&contact.email), &email);
        let contact_phone = or_fallback(digits(&contact.phone), &phone);

        CustomerPayload {
            person_type: person_type.to_string(),
            tax_id,
            legal_name,
            trade_name,
            type_code,
            state_registration,
            has_state_registration: has_state_registration.to_string(),
            municipal_registration: text(&company.municipal_registration),
            street: text(&address.street),
            number: text(&address.number),
            complement: text(&address.complement),
            district: text(&address.district),
            city,
            state,
            postal_code: digits(&address.postal_code),
            municipality_code,
            country_code: resolve_code(overrides.country_code.as_deref(), None, &defaults.country_code, None)
                .value,
            email,
            phone,
            contact_name: text(&contact.name),
            contact_email,
            contact_phone,
            carrier_code: catalog(
                &overrides.carrier_code,
                &selections.carrier,
                &defaults.carrier_code,
                CARRIER_CODE_WIDTH,
            ),
            price_list_code: catalog(
                &overrides.price_list_code,
                &selections.price_list,
                &defaults.price_list_code,
                PRICE_LIST_CODE_WIDTH,
            ),
            billing_method_code: catalog(
                &overrides.billing_method_code,
                &selections.billing_method,
                &defaults.billing_method_code,
                BILLING_METHOD_CODE_WIDTH,
            ),
            activity_branch_code: catalog(
                &overrides.activity_branch_code,
                &selections.activity_branch,
                &defaults.activity_branch_code,
                ACTIVITY_BRANCH_CODE_WIDTH,
            ),
            payment_condition_code: catalog(
                &overrides.payment_condition_code,
                &selections.payment_condition,
                &defaults.payment_condition_code,
                PAYMENT_CONDITION_CODE_WIDTH,
            ),
            sales_rep_code: resolve_code(
                overrides.sales_rep_code.as_deref(),
                None,
                &defaults.sales_rep_code,
                None,
            )
            .value,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn text(value: &Option<String>) -> String {
    non_blank(value).unwrap_or_default().to_string()
}

fn digits(value: &Option<String>) -> String {
    value.as_deref().map(normalize_tax_id).unwrap_or_default()
}

fn or_fallback(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use erpsync_domain::{
        AddressDetails, CompanyProfile, ContactDetails, ExplicitOverrides, FormSelections,
    };

    use super::*;
    use crate::mapping::payload::WIRE_FIELDS;

    fn mapper() -> PayloadMapper {
        let table = MunicipalityTable::new().with_entry("Florianópolis", "SC", "05407");
        PayloadMapper::new(ErpDefaults::default(), Arc::new(table))
    }

    fn entity() -> ConsolidatedBusinessEntity {
        ConsolidatedBusinessEntity {
            company: CompanyProfile {
                tax_id: "11.222.333/0001-81".into(),
                legal_name: " ACME INDUSTRIA LTDA ".into(),
                trade_name: Some("ACME".into()),
                state_registration: Some("255.123.456".into()),
                email: Some("fiscal@acme.example".into()),
                phone: Some("(48) 3333-4444".into()),
                ..CompanyProfile::default()
            },
            address: AddressDetails {
                street: Some("Rua das Flores".into()),
                number: Some("100".into()),
                city: Some("florianopolis".into()),
                state: Some("sc".into()),
                postal_code: Some("88010-000".into()),
                ..AddressDetails::default()
            },
            contact: ContactDetails { name: Some("Maria".into()), ..ContactDetails::default() },
            selections: FormSelections {
                type_code: Some("r".into()),
                carrier: Some(CatalogSelection::new(3, "12")),
                price_list: Some(CatalogSelection { id: 4, code: None }),
                ..FormSelections::default()
            },
            overrides: ExplicitOverrides::default(),
        }
    }

    #[test]
    fn returns_every_wire_field_even_for_an_empty_entity() {
        let payload = mapper().map(&ConsolidatedBusinessEntity::default());
        let wire = payload.to_wire();
        let object = wire.as_object().expect("object");

        for field in WIRE_FIELDS {
            assert!(object.contains_key(field), "missing {field}");
        }
        assert_eq!(payload.person_type, "F");
        assert_eq!(payload.state_registration, "ISENTO");
        assert_eq!(payload.has_state_registration, "2");
    }

    #[test]
    fn derives_person_flag_and_registration_sentinel() {
        let payload = mapper().map(&entity());

        assert_eq!(payload.tax_id, "11222333000181");
        assert_eq!(payload.person_type, "J");
        assert_eq!(payload.state_registration, "255.123.456");
        assert_eq!(payload.has_state_registration, "1");
        assert_eq!(payload.legal_name, "ACME INDUSTRIA LTDA");
    }

    #[test]
    fn catalog_codes_are_padded_and_defaults_fill_gaps() {
        let payload = mapper().map(&entity());

        assert_eq!(payload.type_code, "R");
        assert_eq!(payload.carrier_code, "000012");
        assert_eq!(payload.price_list_code, "001");
        assert_eq!(payload.activity_branch_code, "000001");
        assert_eq!(payload.country_code, "105");
    }

    #[test]
    fn explicit_overrides_are_sent_verbatim() {
        let mut entity = entity();
        entity.overrides = ExplicitOverrides {
            type_code: Some("X".into()),
            carrier_code: Some("7".into()),
            municipality_code: Some("99999".into()),
            ..ExplicitOverrides::default()
        };

        let payload = mapper().map(&entity);
        assert_eq!(payload.type_code, "X");
        assert_eq!(payload.carrier_code, "7");
        assert_eq!(payload.municipality_code, "99999");
    }

    #[test]
    fn resolves_municipality_and_normalises_contact_fields() {
        let payload = mapper().map(&entity());

        assert_eq!(payload.municipality_code, "05407");
        assert_eq!(payload.state, "SC");
        assert_eq!(payload.postal_code, "88010000");
        assert_eq!(payload.phone, "4833334444");
        assert_eq!(payload.contact_phone, "4833334444");
        assert_eq!(payload.contact_email, "fiscal@acme.example");
        assert_eq!(payload.contact_name, "Maria");
    }

    #[test]
    fn trade_name_falls_back_to_legal_name() {
        let mut entity = entity();
        entity.company.trade_name = None;
        entity.company.state_registration = Some("   ".into());

        let payload = mapper().map(&entity);
        assert_eq!(payload.trade_name, "ACME INDUSTRIA LTDA");
        assert_eq!(payload.has_state_registration, "2");
        assert!(payload.validate().is_ok());
    }
}
