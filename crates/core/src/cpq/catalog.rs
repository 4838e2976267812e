use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{
    connection::{ConnectionPriceEntry, ConnectionSpec},
    material::MaterialDefinition,
    option::OptionDefinition,
    product::{ProductId, ProductInstance},
    rules::LengthAdderRule,
};

/// Read-only view of the product catalog used by the pricing pipeline.
/// "Not found" is always `None`; the engine decides whether a miss is fatal.
pub trait CatalogLookup: Send + Sync {
    fn product(&self, id: &ProductId) -> Option<&ProductInstance>;
    fn material(&self, code: &str) -> Option<&MaterialDefinition>;
    fn option(&self, name: &str, family_key: &str) -> Option<&OptionDefinition>;
    fn length_adder_rule(&self, family_key: &str, material_code: &str)
        -> Option<&LengthAdderRule>;
    fn connection_price(&self, connection: &ConnectionSpec) -> Option<Decimal>;
    fn cross_material_variant(
        &self,
        model_number: &str,
        voltage: &str,
        material_code: &str,
    ) -> Option<&ProductInstance>;
}

impl<C: CatalogLookup + ?Sized> CatalogLookup for &C {
    fn product(&self, id: &ProductId) -> Option<&ProductInstance> {
        (**self).product(id)
    }

    fn material(&self, code: &str) -> Option<&MaterialDefinition> {
        (**self).material(code)
    }

    fn option(&self, name: &str, family_key: &str) -> Option<&OptionDefinition> {
        (**self).option(name, family_key)
    }

    fn length_adder_rule(
        &self,
        family_key: &str,
        material_code: &str,
    ) -> Option<&LengthAdderRule> {
        (**self).length_adder_rule(family_key, material_code)
    }

    fn connection_price(&self, connection: &ConnectionSpec) -> Option<Decimal> {
        (**self).connection_price(connection)
    }

    fn cross_material_variant(
        &self,
        model_number: &str,
        voltage: &str,
        material_code: &str,
    ) -> Option<&ProductInstance> {
        (**self).cross_material_variant(model_number, voltage, material_code)
    }
}

impl<C: CatalogLookup + ?Sized> CatalogLookup for Arc<C> {
    fn product(&self, id: &ProductId) -> Option<&ProductInstance> {
        (**self).product(id)
    }

    fn material(&self, code: &str) -> Option<&MaterialDefinition> {
        (**self).material(code)
    }

    fn option(&self, name: &str, family_key: &str) -> Option<&OptionDefinition> {
        (**self).option(name, family_key)
    }

    fn length_adder_rule(
        &self,
        family_key: &str,
        material_code: &str,
    ) -> Option<&LengthAdderRule> {
        (**self).length_adder_rule(family_key, material_code)
    }

    fn connection_price(&self, connection: &ConnectionSpec) -> Option<Decimal> {
        (**self).connection_price(connection)
    }

    fn cross_material_variant(
        &self,
        model_number: &str,
        voltage: &str,
        material_code: &str,
    ) -> Option<&ProductInstance> {
        (**self).cross_material_variant(model_number, voltage, material_code)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {message}")]
    ParseFile { path: PathBuf, message: String },
    #[error("could not parse catalog: {0}")]
    Parse(String),
    #[error("duplicate product id `{0}`")]
    DuplicateProduct(String),
    #[error("duplicate material code `{0}`")]
    DuplicateMaterial(String),
    #[error("option `{name}` is defined more than once for family `{family}`")]
    DuplicateOption { name: String, family: String },
    #[error("option `{0}` does not list any product family")]
    OptionWithoutFamily(String),
    #[error("length adder rule for `{family}`/`{material}` is defined more than once")]
    DuplicateLengthRule { family: String, material: String },
    #[error("connection price for `{0}` is defined more than once")]
    DuplicateConnectionPrice(String),
    #[error("connection price entry `{0}` is not a flange or tri-clamp connection")]
    UnpricedConnectionType(String),
}

/// Serialized form of the catalog, as read from a TOML or JSON file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub products: Vec<ProductInstance>,
    #[serde(default)]
    pub materials: Vec<MaterialDefinition>,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    #[serde(default)]
    pub length_adder_rules: Vec<LengthAdderRule>,
    #[serde(default)]
    pub connection_prices: Vec<ConnectionPriceEntry>,
}

impl CatalogSnapshot {
    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        toml::from_str(raw).map_err(|error| CatalogError::Parse(error.to_string()))
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|error| CatalogError::Parse(error.to_string()))
    }

    /// Reads a snapshot file; `.json` files are parsed as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;

        let is_json = path.extension().is_some_and(|extension| extension == "json");
        let parsed = if is_json { Self::from_json_str(&raw) } else { Self::from_toml_str(&raw) };
        parsed.map_err(|error| match error {
            CatalogError::Parse(message) => {
                CatalogError::ParseFile { path: path.to_path_buf(), message }
            }
            other => other,
        })
    }
}

/// Indexed, validated catalog. Immutable once built, so concurrent
/// calculations can share one instance behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: HashMap<ProductId, ProductInstance>,
    materials: HashMap<String, MaterialDefinition>,
    options: HashMap<(String, String), OptionDefinition>,
    length_rules: HashMap<(String, String), LengthAdderRule>,
    connection_prices: HashMap<ConnectionSpec, Decimal>,
}

impl InMemoryCatalog {
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for product in snapshot.products {
            if catalog.products.contains_key(&product.id) {
                return Err(CatalogError::DuplicateProduct(product.id.0));
            }
            catalog.products.insert(product.id.clone(), product);
        }

        for material in snapshot.materials {
            if catalog.materials.contains_key(&material.code) {
                return Err(CatalogError::DuplicateMaterial(material.code));
            }
            catalog.materials.insert(material.code.clone(), material);
        }

        for option in snapshot.options {
            if option.product_families.is_empty() {
                return Err(CatalogError::OptionWithoutFamily(option.name));
            }
            let mut seen = HashSet::new();
            for family in &option.product_families {
                let key = (option.name.clone(), family.clone());
                if !seen.insert(family) || catalog.options.contains_key(&key) {
                    return Err(CatalogError::DuplicateOption {
                        name: option.name.clone(),
                        family: family.clone(),
                    });
                }
                catalog.options.insert(key, option.clone());
            }
        }

        for rule in snapshot.length_adder_rules {
            let key = (rule.family.clone(), rule.material_code.clone());
            if catalog.length_rules.contains_key(&key) {
                return Err(CatalogError::DuplicateLengthRule {
                    family: rule.family,
                    material: rule.material_code,
                });
            }
            catalog.length_rules.insert(key, rule);
        }

        for entry in snapshot.connection_prices {
            let spec = entry.spec();
            let Some(label) = spec.adder_key() else {
                return Err(CatalogError::UnpricedConnectionType(entry.connection_type));
            };
            if catalog.connection_prices.insert(spec, entry.price).is_some() {
                return Err(CatalogError::DuplicateConnectionPrice(label));
            }
        }

        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_snapshot(CatalogSnapshot::load(path)?)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn family_count(&self) -> usize {
        self.options.keys().map(|(_, family)| family).collect::<HashSet<_>>().len()
    }
}

impl CatalogLookup for InMemoryCatalog {
    fn product(&self, id: &ProductId) -> Option<&ProductInstance> {
        self.products.get(id)
    }

    fn material(&self, code: &str) -> Option<&MaterialDefinition> {
        self.materials.get(code)
    }

    fn option(&self, name: &str, family_key: &str) -> Option<&OptionDefinition> {
        self.options.get(&(name.to_string(), family_key.to_string()))
    }

    fn length_adder_rule(
        &self,
        family_key: &str,
        material_code: &str,
    ) -> Option<&LengthAdderRule> {
        self.length_rules.get(&(family_key.to_string(), material_code.to_string()))
    }

    fn connection_price(&self, connection: &ConnectionSpec) -> Option<Decimal> {
        self.connection_prices.get(connection).copied()
    }

    fn cross_material_variant(
        &self,
        model_number: &str,
        voltage: &str,
        material_code: &str,
    ) -> Option<&ProductInstance> {
        let mut candidates = self.products.values().filter(|product| {
            product.model_number == model_number
                && product.voltage == voltage
                && product.default_material == material_code
        });
        let first = candidates.next()?;
        // HashMap order is arbitrary; pick the lowest id so repeated lookups agree.
        Some(candidates.fold(first, |best, next| if next.id < best.id { next } else { best }))
    }
}


#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use tempfile::TempDir;

    use super::{fixtures, CatalogError, CatalogLookup, CatalogSnapshot, InMemoryCatalog};
    use crate::domain::{
        connection::ConnectionSpec, option::MATERIAL_OPTION, product::ProductId,
        rules::AdderType,
    };

    #[test]
    fn fixture_catalog_indexes_every_record() {
        let catalog = fixtures::catalog();

        assert_eq!(catalog.product_count(), 8);
        assert_eq!(catalog.material_count(), 4);
        assert_eq!(catalog.family_count(), 2);
        assert!(catalog.product(&ProductId::new("F1-S-115")).is_some());
        assert!(catalog.product(&ProductId::new("F9-S-115")).is_none());
        assert!(catalog.material("H").is_some());
    }

    #[test]
    fn options_are_scoped_per_family() {
        let catalog = fixtures::catalog();

        let f1 = catalog.option(MATERIAL_OPTION, "F1").expect("F1 material option");
        let f1_2 = catalog.option(MATERIAL_OPTION, "F1/2").expect("F1/2 material option");
        assert!(f1.offers("U"));
        assert!(!f1_2.offers("U"));
        assert_eq!(f1_2.adder("H"), Some(fixtures::dec("92.50")));
        assert!(catalog.option(MATERIAL_OPTION, "F3").is_none());
    }

    #[test]
    fn length_rules_keep_unrecognised_types() {
        let catalog = fixtures::catalog();

        let rule = catalog.length_adder_rule("F1/2", "S").expect("rule");
        assert_eq!(rule.adder_type, AdderType::Unrecognized("per_meter".to_string()));
        assert_eq!(
            catalog.length_adder_rule("F1", "S").map(|rule| rule.adder_amount),
            Some(fixtures::dec("3.75"))
        );
    }

    #[test]
    fn connection_prices_are_keyed_by_typed_spec() {
        let catalog = fixtures::catalog();

        let flange = ConnectionSpec::from_parts("Flange", Some("150#"), Some("2"));
        let clamp = ConnectionSpec::from_parts("Tri-Clamp", None, Some("1.5"));
        let other = ConnectionSpec::from_parts("Flange", Some("300#"), Some("2"));

        assert_eq!(catalog.connection_price(&flange), Some(Decimal::new(42, 0)));
        assert_eq!(catalog.connection_price(&clamp), Some(Decimal::new(18, 0)));
        assert_eq!(catalog.connection_price(&other), None);
    }

    #[test]
    fn cross_material_variant_matches_model_voltage_and_material() {
        let catalog = fixtures::catalog();

        let variant = catalog.cross_material_variant("F1", "24VDC", "S").expect("stock variant");
        assert_eq!(variant.id, ProductId::new("F1-S-24"));
        assert!(catalog.cross_material_variant("F1", "240VAC", "S").is_none());
    }

    #[test]
    fn shared_catalog_is_usable_through_arc() {
        let catalog = Arc::new(fixtures::catalog());
        let shared = Arc::clone(&catalog);

        let handle = std::thread::spawn(move || shared.material("S").map(|m| m.name.clone()));
        let name = handle.join().expect("thread joins");
        assert_eq!(name.as_deref(), Some("316 Stainless Steel"));
        assert!(catalog.product(&ProductId::new("F1-S-115")).is_some());
    }

    #[test]
    fn duplicate_option_for_family_is_rejected() {
        let mut snapshot = fixtures::snapshot();
        let mut duplicate = snapshot.options[0].clone();
        duplicate.product_families = vec!["F1".to_string()];
        snapshot.options.push(duplicate);

        let error = InMemoryCatalog::from_snapshot(snapshot).expect_err("duplicate option");
        assert!(matches!(
            error,
            CatalogError::DuplicateOption { ref name, ref family }
                if name == "Material" && family == "F1"
        ));
    }

    #[test]
    fn duplicate_length_rule_is_rejected() {
        let mut snapshot = fixtures::snapshot();
        let duplicate = snapshot.length_adder_rules[0].clone();
        snapshot.length_adder_rules.push(duplicate);

        let error = InMemoryCatalog::from_snapshot(snapshot).expect_err("duplicate rule");
        assert!(matches!(error, CatalogError::DuplicateLengthRule { .. }));
    }

    #[test]
    fn duplicate_product_and_material_are_rejected() {
        let mut snapshot = fixtures::snapshot();
        snapshot.products.push(snapshot.products[0].clone());
        assert!(matches!(
            InMemoryCatalog::from_snapshot(snapshot),
            Err(CatalogError::DuplicateProduct(ref id)) if id == "F1-S-115"
        ));

        let mut snapshot = fixtures::snapshot();
        snapshot.materials.push(snapshot.materials[0].clone());
        assert!(matches!(
            InMemoryCatalog::from_snapshot(snapshot),
            Err(CatalogError::DuplicateMaterial(ref code)) if code == "S"
        ));
    }

    #[test]
    fn option_without_family_is_rejected() {
        let mut snapshot = fixtures::snapshot();
        snapshot.options[0].product_families.clear();

        assert!(matches!(
            InMemoryCatalog::from_snapshot(snapshot),
            Err(CatalogError::OptionWithoutFamily(_))
        ));
    }

    #[test]
    fn unpriced_connection_entry_is_rejected() {
        let mut snapshot = fixtures::snapshot();
        let mut entry = snapshot.connection_prices[0].clone();
        entry.connection_type = "NPT".to_string();
        entry.rating = None;
        snapshot.connection_prices.push(entry);

        assert!(matches!(
            InMemoryCatalog::from_snapshot(snapshot),
            Err(CatalogError::UnpricedConnectionType(ref kind)) if kind == "NPT"
        ));
    }

    #[test]
    fn json_snapshot_round_trips_through_loader() {
        let snapshot = fixtures::snapshot();
        let json = serde_json::to_string(&snapshot).expect("serialize");
        let parsed = CatalogSnapshot::from_json_str(&json).expect("parse json");
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn load_reports_file_path_on_parse_failure() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, "[[products]]\nid = 3\n").expect("write");

        let error = CatalogSnapshot::load(&path).expect_err("invalid catalog");
        assert!(matches!(error, CatalogError::ParseFile { .. }));
        assert!(error.to_string().contains("catalog.toml"));
    }

    #[test]
    fn load_reads_toml_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        fs::write(&path, fixtures::SNAPSHOT).expect("write");

        let catalog = InMemoryCatalog::load(&path).expect("load");
        assert_eq!(catalog.product_count(), 8);
    }
}
