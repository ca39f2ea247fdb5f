//! Input types and code tables for the geodata API.
//!
//! # Design
//! The vendor takes every parameter as a query string value, so these types
//! only exist to give call sites names and defaults. Each knows how to render
//! itself into the exact wire value. Responses stay untyped
//! (`serde_json::Value`); only the coordinate transform is narrowed.

use serde::{Deserialize, Serialize};

/// Coordinate system of a stored POI (`coord_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CoordType {
    /// Raw GPS latitude/longitude.
    Gps = 1,
    /// National Bureau of Surveying encrypted latitude/longitude.
    NationalBureau = 2,
    /// Baidu encrypted latitude/longitude.
    BaiduLl = 3,
    /// Baidu encrypted Mercator.
    BaiduMc = 4,
}

impl CoordType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Value type stored in a geotable column (`type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ColumnType {
    Int64 = 1,
    Double = 2,
    String = 3,
    ImageUrl = 4,
}

impl ColumnType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ColumnType::Int64),
            2 => Some(ColumnType::Double),
            3 => Some(ColumnType::String),
            4 => Some(ColumnType::ImageUrl),
            _ => None,
        }
    }
}

/// Source/target system codes accepted by the geoconv endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ConvSystem {
    /// Raw GPS (WGS-84).
    Wgs84 = 1,
    Sogou = 2,
    /// National Bureau encrypted (GCJ-02).
    Gcj02 = 3,
    Gcj02Mercator = 4,
    /// Baidu encrypted latitude/longitude (BD-09).
    Bd09Ll = 5,
    Bd09Mc = 6,
    Mapbar = 7,
    Map51 = 8,
}

impl ConvSystem {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ConvSystem::Wgs84),
            2 => Some(ConvSystem::Sogou),
            3 => Some(ConvSystem::Gcj02),
            4 => Some(ConvSystem::Gcj02Mercator),
            5 => Some(ConvSystem::Bd09Ll),
            6 => Some(ConvSystem::Bd09Mc),
            7 => Some(ConvSystem::Mapbar),
            8 => Some(ConvSystem::Map51),
            _ => None,
        }
    }
}

/// Parameters for creating a geotable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTable {
    pub name: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

impl NewTable {
    /// A published table named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_published: true,
        }
    }
}

/// Parameters for creating a column in a geotable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    pub key: String,
    pub column_type: ColumnType,
    #[serde(default)]
    pub is_search_field: bool,
    #[serde(default)]
    pub is_index_field: bool,
}

impl NewColumn {
    pub fn new(name: impl Into<String>, key: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            column_type,
            is_search_field: false,
            is_index_field: false,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.is_search_field = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.is_index_field = true;
        self
    }
}

/// Title, address and position of a point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiInput {
    pub title: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Page selector for POI listing. Passed through, never iterated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub index: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { index: 0, size: 200 }
    }
}

/// Source and target system for a coordinate transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    pub from: ConvSystem,
    pub to: ConvSystem,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            from: ConvSystem::Wgs84,
            to: ConvSystem::Bd09Ll,
        }
    }
}

/// Render a boolean flag the way the vendor expects it.
pub(crate) fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_type_codes() {
        assert_eq!(CoordType::Gps.code(), 1);
        assert_eq!(CoordType::NationalBureau.code(), 2);
        assert_eq!(CoordType::BaiduLl.code(), 3);
        assert_eq!(CoordType::BaiduMc.code(), 4);
    }

    #[test]
    fn column_type_code_lookup() {
        assert_eq!(ColumnType::from_code(3), Some(ColumnType::String));
        assert_eq!(ColumnType::ImageUrl.code(), 4);
        assert_eq!(ColumnType::from_code(0), None);
        assert_eq!(ColumnType::from_code(5), None);
    }

    #[test]
    fn conv_system_code_lookup() {
        assert_eq!(ConvSystem::from_code(5), Some(ConvSystem::Bd09Ll));
        assert_eq!(ConvSystem::from_code(9), None);
    }

    #[test]
    fn defaults() {
        assert_eq!(Page::default(), Page { index: 0, size: 200 });
        let conv = Conversion::default();
        assert_eq!(conv.from.code(), 1);
        assert_eq!(conv.to.code(), 5);
        assert!(NewTable::new("stores").is_published);
        let col = NewColumn::new("storeId", "storeId", ColumnType::String);
        assert!(!col.is_search_field);
        assert!(!col.is_index_field);
    }

    #[test]
    fn new_table_published_defaults_when_omitted() {
        let table: NewTable = serde_json::from_str(r#"{"name":"stores"}"#).unwrap();
        assert!(table.is_published);
    }

    #[test]
    fn column_builder_flags() {
        let col = NewColumn::new("rank", "rank", ColumnType::Int64)
            .searchable()
            .indexed();
        assert!(col.is_search_field);
        assert!(col.is_index_field);
    }
}
