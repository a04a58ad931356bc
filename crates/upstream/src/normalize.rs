//! Provider name normalization.
//!
//! The provider returns human-readable French names ("Esch/Alzette",
//! "Camionnette", "Remorque < 3,5 t"); keys and URLs need stable ASCII
//! identifiers. Substitutions run in declaration order ("camionnette" must
//! be rewritten before "camion").

use unicode_normalization::UnicodeNormalization;

/// French vehicle names mapped onto English slugs. The trailer entries match
/// the intermediate form produced by the "remorque" substitution.
const VEHICLE_SYNONYMS: [(&str, &str); 8] = [
    ("voiture", "car"),
    ("tracteur", "tractor"),
    ("camionnette", "van"),
    ("camion", "truck"),
    ("remorque", "trailer"),
    ("autobus / autocar", "bus"),
    ("trailer < 3,5 t", "small_trailer"),
    ("trailer > 3,5 t", "large_trailer"),
];

/// Normalize a site name into a stable identifier:
/// `"Esch/Alzette"` -> `"esch_sur_alzette"`.
pub fn normalize_site(name: &str) -> String {
    let name = name.to_lowercase().replace('/', " sur ");
    ascii_fold(&name.replace(' ', "_"))
}

/// Normalize a vehicle-type name into a stable identifier:
/// `"Remorque < 3,5 t"` -> `"small_trailer"`.
pub fn normalize_vehicle_type(name: &str) -> String {
    let mut name = name.to_lowercase();
    for (from, to) in VEHICLE_SYNONYMS {
        name = name.replace(from, to);
    }
    ascii_fold(&name.replace(' ', "_"))
}

/// NFKD-decompose and keep the ASCII part, dropping diacritics.
fn ascii_fold(name: &str) -> String {
    name.nfkd().filter(char::is_ascii).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_slash_becomes_sur() {
        assert_eq!(normalize_site("Esch/Alzette"), "esch_sur_alzette");
    }

    #[test]
    fn site_diacritics_are_stripped() {
        assert_eq!(normalize_site("Pétange"), "petange");
        assert_eq!(normalize_site("Wilwerwiltz"), "wilwerwiltz");
    }

    #[test]
    fn vehicle_synonyms_apply() {
        assert_eq!(normalize_vehicle_type("Voiture"), "car");
        assert_eq!(normalize_vehicle_type("Camionnette"), "van");
        assert_eq!(normalize_vehicle_type("Camion"), "truck");
        assert_eq!(normalize_vehicle_type("Autobus / Autocar"), "bus");
        assert_eq!(normalize_vehicle_type("Tracteur"), "tractor");
    }

    #[test]
    fn trailer_sizes_split() {
        assert_eq!(normalize_vehicle_type("Remorque < 3,5 t"), "small_trailer");
        assert_eq!(normalize_vehicle_type("Remorque > 3,5 t"), "large_trailer");
        assert_eq!(normalize_vehicle_type("Remorque"), "trailer");
    }

    #[test]
    fn unknown_names_fall_back_to_folded_form() {
        assert_eq!(normalize_vehicle_type("Motocycle"), "motocycle");
        assert_eq!(normalize_vehicle_type("Quad à moteur"), "quad_a_moteur");
    }
}
