use std::io::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNote {
  Primary,
  Extra,
  None,
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
  pub note: ColumnNote,
}

impl Default for ColumnMapper {
  fn default() -> Self {
    Self {
      name: "".to_string(),
      column: "".to_string(),
      note: ColumnNote::None,
    }
  }
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::None,
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  pub fn get_columns(&self, all_columns: bool) -> String {
    self.columns.iter().filter_map(|col| {
      if all_columns || col.note != ColumnNote::Extra {
        Some(col.column.clone())
      } else {
        None
      }
    }).collect::<Vec<String>>().join(", ")
  }

  pub fn build_select_query(&self, all_columns: bool) -> String {
    let mut buf = Vec::new();
    let mut first = true;
    write!(buf, "SELECT ").unwrap();
    for col in self.columns.iter() {
      if all_columns || col.note != ColumnNote::Extra {
        if first {
          write!(buf, "{}", col.column).unwrap();
          first = false;
        } else {
          write!(buf, ", {}", col.column).unwrap();
        }
      }
    }
    write!(buf, " FROM {}", self.table_name).unwrap();
    String::from_utf8_lossy(&buf).to_string()
  }

  /// Insert that ignores rows already present.  Used for link tables
  /// where repeating the action must stay a no-op.
  pub fn build_upsert_ignore(&self, on_conflict: &str, all_columns: bool) -> String {
    let mut buf = Vec::new();
    let mut idx = 0;
    let mut values = Vec::new();
    write!(buf, "INSERT INTO {}(", self.table_name).unwrap();
    for col in self.columns.iter() {
      if all_columns || col.note != ColumnNote::Extra {
        if idx > 0 {
          write!(buf, ",").unwrap();
        }
        idx += 1;
        values.push(format!("${}", idx));
        write!(buf, "{}", col.column).unwrap();
      }
    }
    write!(buf, r#") VALUES({})
      ON CONFLICT {} DO NOTHING"#, values.join(", "), on_conflict).unwrap();
    String::from_utf8_lossy(&buf).to_string()
  }
}
