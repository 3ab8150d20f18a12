//! Shared fixtures for infra integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use erpsync_core::MunicipalityTable;
use erpsync_domain::{
    AddressDetails, CatalogIds, CatalogTable, CompanyProfile, Config, ConsolidatedBusinessEntity,
    ErpConfig,
};
use erpsync_infra::{CustomerSyncService, DbManager, SqliteRegistrationRepository};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TAX_ID: &str = "11222333000181";
pub const FORMATTED_TAX_ID: &str = "11.222.333/0001-81";

/// Migrated database plus a scratch directory for the token file. Both live
/// as long as the fixture.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub repository: SqliteRegistrationRepository,
    temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::new(temp_dir.path().join("portal.db"), 4)
            .expect("db manager should be created");
        manager.run_migrations().expect("migrations should apply");
        let manager = Arc::new(manager);

        Self { repository: SqliteRegistrationRepository::new(Arc::clone(&manager)), manager, temp_dir }
    }

    pub fn token_file(&self) -> PathBuf {
        self.temp_dir.path().join(".erp-token")
    }

    /// Seed one row in each catalog table with id 1.
    pub async fn seed_catalogs(&self) {
        for table in CatalogTable::ALL {
            self.repository
                .upsert_catalog_entry(table, 1, Some("000001"), "Default")
                .await
                .expect("catalog row should be inserted");
        }
    }

    pub fn config(&self, base_url: &str) -> Config {
        Config {
            erp: ErpConfig {
                base_url: Some(base_url.to_string()),
                username: Some("portal".into()),
                password: Some("s3cret".into()),
                token_file: self.token_file(),
                ..ErpConfig::default()
            },
            catalog_ids: CatalogIds {
                carrier_id: Some(1),
                price_list_id: Some(1),
                billing_method_id: Some(1),
                activity_branch_id: Some(1),
            },
            ..Config::default()
        }
    }

    pub fn sync_service(&self, base_url: &str) -> CustomerSyncService {
        CustomerSyncService::from_config(
            &self.config(base_url),
            Arc::new(self.repository.clone()),
            Arc::new(MunicipalityTable::new().with_entry("São Paulo", "SP", "50308")),
        )
        .expect("sync service should build")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn entity() -> ConsolidatedBusinessEntity {
    ConsolidatedBusinessEntity {
        company: CompanyProfile {
            tax_id: FORMATTED_TAX_ID.into(),
            legal_name: "ACME INDUSTRIA LTDA".into(),
            trade_name: Some("ACME".into()),
            email: Some("compras@acme.com.br".into()),
            ..CompanyProfile::default()
        },
        address: AddressDetails {
            city: Some("Sao Paulo".into()),
            state: Some("sp".into()),
            postal_code: Some("01310-100".into()),
            ..AddressDetails::default()
        },
        ..ConsolidatedBusinessEntity::default()
    }
}

/// Login answering with `token`, expected `times` times.
pub async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": token})))
        .expect(times)
        .mount(server)
        .await;
}

/// Every lookup answers with an empty list unless a higher-priority mock
/// matches first.
pub async fn mount_empty_lookups(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/customers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .with_priority(10)
        .mount(server)
        .await;
}

pub async fn mount_create(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/customers"))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}
