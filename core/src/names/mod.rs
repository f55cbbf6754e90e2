//! Display names for weapons and vehicles.
//!
//! Statistics always store internal identifiers. Everything here turns those
//! identifiers into something readable and decides which vehicle variants are
//! counted together under one aggregation parent.

mod table;
mod vehicles;
mod weapons;

pub use table::NamesTable;
pub use vehicles::{VehicleNames, VehicleParents};
pub use weapons::WeaponNames;

/// Strip a trailing `_` followed by `min..=max` ASCII digits.
fn strip_numeric_suffix(name: &str, min: usize, max: usize) -> &str {
    let digits = name
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits < min || digits > max {
        return name;
    }
    let cut = name.len() - digits;
    match name[..cut].strip_suffix('_') {
        Some(base) => base,
        None => name,
    }
}

/// Weapon instance ids are ten or more digits.
pub(crate) fn strip_weapon_instance_id(name: &str) -> &str {
    strip_numeric_suffix(name, 10, usize::MAX)
}

/// Vehicle instance ids are exactly thirteen digits.
pub(crate) fn strip_vehicle_instance_id(name: &str) -> &str {
    strip_numeric_suffix(name, 13, 13)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_ids_need_at_least_ten_digits() {
        assert_eq!(
            strip_weapon_instance_id("GLSN_BallisticGatling_S4_7376494911512"),
            "GLSN_BallisticGatling_S4"
        );
        assert_eq!(strip_weapon_instance_id("behr_rifle_ballistic_01"), "behr_rifle_ballistic_01");
        assert_eq!(strip_weapon_instance_id("1234567890"), "1234567890");
    }

    #[test]
    fn vehicle_ids_need_exactly_thirteen_digits() {
        assert_eq!(
            strip_vehicle_instance_id("DRAK_Cutlass_Black_PU_AI_CRIM_QIG_7232617732776"),
            "DRAK_Cutlass_Black_PU_AI_CRIM_QIG"
        );
        assert_eq!(
            strip_vehicle_instance_id("DRAK_Cutlass_Black_12345678901234"),
            "DRAK_Cutlass_Black_12345678901234"
        );
        assert_eq!(strip_vehicle_instance_id("ANVL_Arrow"), "ANVL_Arrow");
    }
}
