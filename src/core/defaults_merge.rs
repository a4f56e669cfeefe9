// src/core/defaults_merge.rs

use crate::models::{Table, Value};

/// Copies every entry of `src` that `dst` lacks into `dst` (first writer wins).
///
/// Where both sides hold a table under the same key, the merge recurses so a
/// partially specified `dst` table still receives the missing leaves. Copied
/// tables are deep copies: `src` is never mutated and never aliased by `dst`.
/// A scalar already in `dst` is never replaced, even by a table.
pub fn merge(dst: &Table, src: &Table) {
    for (key, src_value) in src.entries() {
        match dst.get(&key) {
            None => {
                dst.insert(key, src_value.deep_clone());
            }
            Some(Value::Table(dst_table)) => {
                if let Value::Table(src_table) = &src_value {
                    // Never recurse into a container shared with the source.
                    if !dst_table.ptr_eq(src_table) {
                        merge(&dst_table, src_table);
                    }
                }
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path_resolver::{get_path, set_path};

    #[test]
    fn test_existing_keys_win() {
        let dst = Table::new();
        let src = Table::new();
        set_path(&dst, "a", Value::from(1)).unwrap();
        set_path(&src, "a", Value::from(2)).unwrap();
        set_path(&src, "b", Value::from(3)).unwrap();

        merge(&dst, &src);

        assert_eq!(get_path(&dst, "a").unwrap(), Some(Value::from(1)));
        assert_eq!(get_path(&dst, "b").unwrap(), Some(Value::from(3)));
    }

    #[test]
    fn test_nested_tables_receive_missing_leaves() {
        let dst = Table::new();
        let src = Table::new();
        set_path(&dst, "frame.width", Value::from(100)).unwrap();
        set_path(&src, "frame.width", Value::from(50)).unwrap();
        set_path(&src, "frame.height", Value::from(20)).unwrap();

        merge(&dst, &src);

        assert_eq!(get_path(&dst, "frame.width").unwrap(), Some(Value::from(100)));
        assert_eq!(get_path(&dst, "frame.height").unwrap(), Some(Value::from(20)));
    }

    #[test]
    fn test_source_is_copied_not_aliased() {
        let dst = Table::new();
        let src = Table::new();
        set_path(&src, "colors.bg", Value::from("black")).unwrap();

        merge(&dst, &src);
        set_path(&dst, "colors.bg", Value::from("white")).unwrap();

        assert_eq!(get_path(&src, "colors.bg").unwrap(), Some(Value::from("black")));
        let copied = dst.get_table(&"colors".into()).unwrap();
        assert!(!copied.ptr_eq(&src.get_table(&"colors".into()).unwrap()));
    }

    #[test]
    fn test_scalar_in_destination_blocks_table_from_source() {
        let dst = Table::new();
        let src = Table::new();
        set_path(&dst, "font", Value::from("Arial")).unwrap();
        set_path(&src, "font.size", Value::from(12)).unwrap();

        merge(&dst, &src);

        assert_eq!(get_path(&dst, "font").unwrap(), Some(Value::from("Arial")));
    }
}
