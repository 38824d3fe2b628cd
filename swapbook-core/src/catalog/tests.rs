//! Tests for the catalog model

#[cfg(test)]
mod model_tests {
    use crate::catalog::{BrandCarEntry, Car, Catalog};
    use pretty_assertions::assert_eq;

    fn sample_database_json() -> &'static str {
        r#"{
  "carsByBrand": {
    "Toyota": [
      {"car": "Supra", "swappableEngines": ["2JZ", "B58"]},
      {"car": "AE86", "swappableEngines": ["4A-GE", "20V Blacktop"]}
    ],
    "BMW": [
      {"car": "E30", "swappableEngines": ["S54", "M50"]}
    ],
    "Audi": [
      {"car": "Ur-Quattro", "swappableEngines": []}
    ]
  }
}"#
    }

    #[test]
    fn test_parse_database() {
        let catalog = Catalog::from_json(sample_database_json()).unwrap();
        assert_eq!(catalog.brand_count(), 3);
        assert_eq!(catalog.car_count(), 4);

        let supra = &catalog.cars_by_brand["Toyota"][0];
        assert_eq!(supra.name, "Supra");
        assert_eq!(supra.swappable_engines, vec!["2JZ", "B58"]);
    }

    #[test]
    fn test_brand_order_follows_document() {
        let catalog = Catalog::from_json(sample_database_json()).unwrap();
        let brands: Vec<&str> = catalog.cars_by_brand.keys().map(String::as_str).collect();
        // Not alphabetical: document order
        assert_eq!(brands, vec!["Toyota", "BMW", "Audi"]);
    }

    #[test]
    fn test_entries_flatten_in_order() {
        let catalog = Catalog::from_json(sample_database_json()).unwrap();
        let entries = catalog.entries();

        let pairs: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.brand.as_str(), e.car.name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Toyota", "Supra"),
                ("Toyota", "AE86"),
                ("BMW", "E30"),
                ("Audi", "Ur-Quattro"),
            ]
        );
    }

    #[test]
    fn test_missing_engine_list_defaults_to_empty() {
        let catalog =
            Catalog::from_json(r#"{"carsByBrand": {"Volvo": [{"car": "240"}]}}"#).unwrap();
        assert!(catalog.cars_by_brand["Volvo"][0].swappable_engines.is_empty());
    }

    #[test]
    fn test_unexpected_shape_is_rejected() {
        assert!(Catalog::from_json(r#"{"brands": {}}"#).is_err());
        assert!(Catalog::from_json(r#"{"carsByBrand": {"Volvo": [{"name": "240"}]}}"#).is_err());
        assert!(Catalog::from_json(r#"{"carsByBrand": []}"#).is_err());
        assert!(Catalog::from_json("<html>").is_err());
    }

    #[test]
    fn test_empty_database() {
        let catalog = Catalog::from_json(r#"{"carsByBrand": {}}"#).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.entries().is_empty());
    }

    #[test]
    fn test_insert_extends_existing_brand() {
        let mut catalog = Catalog::new();
        catalog.insert("Honda", vec![Car::new("Civic EG", ["B18C"])]);
        catalog.insert("Mazda", vec![Car::new("Miata NA", ["BP"])]);
        catalog.insert("Honda", vec![Car::new("CRX", ["K20"])]);

        assert_eq!(catalog.brand_count(), 2);
        assert_eq!(
            catalog.entries()[1],
            BrandCarEntry::new("Honda", Car::new("CRX", ["K20"]))
        );
    }

    #[test]
    fn test_wire_field_names() {
        let car = Car::new("Supra", ["2JZ"]);
        let json = serde_json::to_value(&car).unwrap();
        assert_eq!(json["car"], "Supra");
        assert_eq!(json["swappableEngines"][0], "2JZ");

        let mut catalog = Catalog::new();
        catalog.insert("Toyota", vec![car]);
        let reparsed = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, catalog);
    }
}
