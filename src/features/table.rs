// features/table.rs
use crate::domain::EnrichedRecord;
use crate::geo::PoiCategory;

/// Column header of the persisted per-city listing table.
pub const TABLE_HEADER: [&str; 21] = [
    "ID",
    "longitude",
    "latitude",
    "unitPrice",
    "housePrice",
    "houseArea",
    "houseBedroom",
    "houseLivingRoom",
    "houseBathroom",
    "houseOrientation",
    "houseAge",
    "houseSubway",
    "houseHousingPeriod",
    "houseFloorType",
    "houseFloorSum",
    "schoolAround",
    "subwayAround",
    "parkAround",
    "shopping_mallAround",
    "busAround",
    "houseLoc",
];

/// Column header of the simple-layout table, which keeps the combined room
/// count instead of the detailed bedroom/living/bathroom split.
pub const SIMPLE_TABLE_HEADER: [&str; 11] = [
    "ID",
    "houseLoc",
    "longitude",
    "latitude",
    "unitPrice",
    "housePrice",
    "houseArea",
    "houseBedroom",
    "houseRoom",
    "houseOrientation",
    "houseAge",
];

/// Raw cell text treated as missing.
const MISSING_MARKERS: [&str; 7] = ["", "NA", "N/A", "NaN", "nan", "NULL", "null"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn parse(raw: &str) -> Cell {
        let s = raw.trim();
        if MISSING_MARKERS.contains(&s) {
            return Cell::Missing;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(s.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Category label; integral numbers lose their ".0".
    pub fn as_category(&self) -> Option<String> {
        match self {
            Cell::Number(v) => Some(format_number(*v)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Missing => None,
        }
    }

    /// Text written to delimited output. Missing becomes an empty field.
    pub fn render(&self) -> String {
        match self {
            Cell::Number(v) => format_number(*v),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or(Cell::Missing)
    }
}

impl From<Option<String>> for Cell {
    fn from(v: Option<String>) -> Self {
        v.map(Cell::Text).unwrap_or(Cell::Missing)
    }
}

pub(crate) fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Untyped rows under a named header. Every row is as wide as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Short rows are padded with `Missing`, long rows are cut.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn column_mut(&mut self, name: &str) -> Option<impl Iterator<Item = &mut Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter_mut().map(move |r| &mut r[idx]))
    }

    /// Replaces the column if it exists, otherwise appends it.
    pub fn set_column(&mut self, name: &str, cells: Vec<Cell>) {
        let idx = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(Cell::Missing);
                }
                self.columns.len() - 1
            }
        };
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row[idx] = cell;
        }
    }

    /// Drops the named columns; unknown names are ignored.
    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.iter().any(|n| n.as_ref() == c))
            .collect();
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
    }

    /// Stacks tables row-wise. The header is the union of all headers in
    /// first-seen order; cells a table lacks are `Missing`.
    pub fn concat(tables: &[RawTable]) -> RawTable {
        let mut columns: Vec<String> = Vec::new();
        for t in tables {
            for c in &t.columns {
                if !columns.contains(c) {
                    columns.push(c.clone());
                }
            }
        }

        let mut out = RawTable::new(columns);
        for t in tables {
            let mapping: Vec<Option<usize>> =
                out.columns.iter().map(|c| t.column_index(c)).collect();
            for row in &t.rows {
                let cells = mapping
                    .iter()
                    .map(|m| m.map(|i| row[i].clone()).unwrap_or(Cell::Missing))
                    .collect();
                out.rows.push(cells);
            }
        }
        out
    }

    /// Builds the persisted listing table. IDs run 1..=n in record order.
    pub fn from_records(records: &[EnrichedRecord]) -> RawTable {
        let mut table = RawTable::new(TABLE_HEADER.iter().map(|s| s.to_string()).collect());
        let count = |v: Option<u32>| Cell::from(v.map(f64::from));

        for (i, rec) in records.iter().enumerate() {
            let l = &rec.listing;
            let mut row = vec![
                Cell::Number((i + 1) as f64),
                Cell::from(rec.location.map(|c| c.lng)),
                Cell::from(rec.location.map(|c| c.lat)),
                Cell::from(l.unit_price),
                Cell::from(l.total_price),
                Cell::from(l.area),
                count(l.bedrooms),
                count(l.living_rooms),
                count(l.bathrooms),
                Cell::from(l.orientation.clone()),
                Cell::from(l.age.map(f64::from)),
                Cell::Number(if l.near_subway { 1.0 } else { 0.0 }),
                Cell::from(l.housing_period.clone()),
                Cell::from(l.floor_type.map(|f| f.label().to_string())),
                count(l.floor_total),
            ];
            for category in PoiCategory::ALL {
                row.push(count(rec.poi.get(category)));
            }
            row.push(Cell::from(l.address.clone()));
            table.push_row(row);
        }
        table
    }

    /// The simple-layout table: address first, combined room count, no
    /// place counts.
    pub fn from_records_simple(records: &[EnrichedRecord]) -> RawTable {
        let mut table =
            RawTable::new(SIMPLE_TABLE_HEADER.iter().map(|s| s.to_string()).collect());
        let count = |v: Option<u32>| Cell::from(v.map(f64::from));

        for (i, rec) in records.iter().enumerate() {
            let l = &rec.listing;
            table.push_row(vec![
                Cell::Number((i + 1) as f64),
                Cell::from(l.address.clone()),
                Cell::from(rec.location.map(|c| c.lng)),
                Cell::from(rec.location.map(|c| c.lat)),
                Cell::from(l.unit_price),
                Cell::from(l.total_price),
                Cell::from(l.area),
                count(l.bedrooms),
                count(l.room_count),
                Cell::from(l.orientation.clone()),
                Cell::from(l.age.map(f64::from)),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListingRecord;
    use crate::geo::Coordinate;

    #[test]
    fn test_simple_table_keeps_combined_room_count() {
        let located = EnrichedRecord {
            location: Some(Coordinate::new(104.08, 30.65)),
            ..EnrichedRecord::bare(ListingRecord {
                address: Some("锦江-春熙路-红星路".into()),
                bedrooms: Some(3),
                living_rooms: Some(2),
                bathrooms: Some(1),
                room_count: Some(6),
                age: Some(19),
                ..Default::default()
            })
        };
        let unlocated = EnrichedRecord::bare(ListingRecord {
            address: Some("武侯-玉林".into()),
            ..Default::default()
        });

        let table = RawTable::from_records_simple(&[located, unlocated]);
        assert_eq!(table.columns, SIMPLE_TABLE_HEADER);
        assert_eq!(
            table.column("houseRoom").unwrap(),
            vec![&Cell::Number(6.0), &Cell::Missing]
        );
        assert_eq!(table.column("ID").unwrap(), vec![&Cell::Number(1.0), &Cell::Number(2.0)]);
        assert_eq!(table.column("longitude").unwrap()[0], &Cell::Number(104.08));
        assert!(table.column("longitude").unwrap()[1].is_missing());
        assert!(table.column("houseLivingRoom").is_none());
    }

    #[test]
    fn test_parse_cells() {
        assert_eq!(Cell::parse(" 12.5 "), Cell::Number(12.5));
        assert_eq!(Cell::parse("NA"), Cell::Missing);
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("南北"), Cell::Text("南北".into()));
    }

    #[test]
    fn test_category_label_of_integral_number() {
        assert_eq!(Cell::Number(1.0).as_category().as_deref(), Some("1"));
        assert_eq!(Cell::Number(1.5).as_category().as_deref(), Some("1.5"));
    }

    #[test]
    fn test_drop_and_concat() {
        let mut a = RawTable::new(vec!["a".into(), "b".into()]);
        a.push_row(vec![Cell::Number(1.0), Cell::Number(2.0)]);
        let mut b = RawTable::new(vec!["b".into(), "c".into()]);
        b.push_row(vec![Cell::Number(3.0)]);

        let mut both = RawTable::concat(&[a, b]);
        assert_eq!(both.columns, vec!["a", "b", "c"]);
        assert_eq!(both.rows[1], vec![Cell::Missing, Cell::Number(3.0), Cell::Missing]);

        both.drop_columns(&["a", "zzz"]);
        assert_eq!(both.columns, vec!["b", "c"]);
        assert_eq!(both.rows[0], vec![Cell::Number(2.0), Cell::Missing]);
    }
}
