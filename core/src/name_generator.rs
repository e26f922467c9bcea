//! Deterministic name generation from curated Indonesian name lists.
//!
//! Used for officials, counterparties and operating companies.
//! All generation is deterministic (same stream seed = same names).

use std::collections::HashSet;

use crate::rng::TableRng;

/// Fresh draws tried before falling back to a numbered name.
const UNIQUE_NAME_REDRAWS: usize = 32;

/// A regency with nickel concessions and its approximate centre.
#[derive(Debug, Clone, Copy)]
pub struct District {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub const DISTRICTS: &[District] = &[
    District { name: "Morowali", lat: -2.85, lon: 121.95 },
    District { name: "Morowali Utara", lat: -1.95, lon: 121.35 },
    District { name: "Konawe", lat: -3.95, lon: 122.10 },
    District { name: "Konawe Utara", lat: -3.40, lon: 122.05 },
    District { name: "Kolaka", lat: -4.05, lon: 121.60 },
    District { name: "Luwu Timur", lat: -2.55, lon: 121.35 },
    District { name: "Halmahera Tengah", lat: 0.45, lon: 128.00 },
    District { name: "Halmahera Timur", lat: 1.10, lon: 128.25 },
];

/// Positions held by officials in the regulator dataset.
pub const POSITIONS: &[&str] = &[
    "Bupati",
    "Kepala Dinas ESDM",
    "Inspektur Tambang",
    "Anggota DPRD",
    "Camat",
    "Kepala Desa",
    "Kepala Bappeda",
];

/// Deterministic name generator using curated name lists
pub struct NameGenerator;

impl NameGenerator {
    /// Full personal name; roughly a third are single names, as is common.
    pub fn person_name(rng: &mut TableRng) -> String {
        let given = *rng.pick(Self::given_names());
        if rng.chance(0.35) {
            given.to_string()
        } else {
            format!("{} {}", given, rng.pick(Self::family_names()))
        }
    }

    /// A person name not already in `taken`, which is updated. Redraws
    /// first; after too many collisions a number is appended instead.
    pub fn unique_person_name(rng: &mut TableRng, taken: &mut HashSet<String>) -> String {
        for _ in 0..UNIQUE_NAME_REDRAWS {
            let name = Self::person_name(rng);
            if taken.insert(name.clone()) {
                return name;
            }
        }
        let base = Self::person_name(rng);
        let mut n = 2;
        loop {
            let name = format!("{base} {n}");
            if taken.insert(name.clone()) {
                return name;
            }
            n += 1;
        }
    }

    /// Operating company name, e.g. "PT Sulawesi Nikel Mandiri".
    pub fn company_name(rng: &mut TableRng) -> String {
        let region = *rng.pick(Self::company_regions());
        let core = *rng.pick(Self::company_cores());
        let suffix = *rng.pick(Self::company_suffixes());
        format!("PT {region} {core} {suffix}")
    }

    /// Site name by ordinal: Tambang A..Z, then Tambang 27, 28, ...
    pub fn site_name(ordinal: usize) -> String {
        match u8::try_from(ordinal).ok().filter(|n| *n < 26) {
            Some(n) => format!("Tambang {}", (b'A' + n) as char),
            None => format!("Tambang {}", ordinal + 1),
        }
    }

    fn given_names() -> &'static [&'static str] {
        &[
            "Budi", "Agus", "Andi", "Rudi", "Hendra", "Joko", "Bambang", "Slamet",
            "Hasan", "Arif", "Yusuf", "Rizal", "Fajar", "Dedi", "Taufik", "Irwan",
            "Siti", "Dewi", "Sri", "Ratna", "Wulan", "Indah", "Lestari", "Fitri",
            "Nurul", "Rina", "Yanti", "Ayu", "Putri", "Maya", "Kartika", "Rahmawati",
        ]
    }

    fn family_names() -> &'static [&'static str] {
        &[
            "Santoso", "Wijaya", "Saputra", "Hidayat", "Kurniawan", "Setiawan",
            "Pratama", "Nugroho", "Siregar", "Simanjuntak", "Lumban", "Pangaribuan",
            "Mappaseng", "Daeng", "Lamba", "Tandiono", "Halim", "Gunawan",
            "Sulistyo", "Wibowo", "Rahman", "Syahputra", "Tanjung", "Lubis",
        ]
    }

    fn company_regions() -> &'static [&'static str] {
        &[
            "Sulawesi", "Celebes", "Morowali", "Konawe", "Halmahera", "Bumi",
            "Nusantara", "Timur", "Kolaka", "Bahodopi",
        ]
    }

    fn company_cores() -> &'static [&'static str] {
        &[
            "Nikel", "Mineral", "Tambang", "Logam", "Smelter", "Resources",
            "Metal", "Energi",
        ]
    }

    fn company_suffixes() -> &'static [&'static str] {
        &[
            "Utama", "Sejahtera", "Abadi", "Makmur", "Mandiri", "Persada",
            "Perkasa", "Jaya", "Sentosa", "Lestari",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_generation_deterministic() {
        let mut rng1 = TableRng::new(42, 0);
        let mut rng2 = TableRng::new(42, 0);

        let name1 = NameGenerator::person_name(&mut rng1);
        let name2 = NameGenerator::person_name(&mut rng2);

        assert_eq!(name1, name2, "Same seed should produce same name");
    }

    #[test]
    fn test_unique_names_never_repeat() {
        let mut rng = TableRng::new(3, 3);
        let mut taken = HashSet::new();
        // More names than the single-name pool holds, so the numbered
        // fallback gets exercised too.
        let names: Vec<String> = (0..1_000)
            .map(|_| NameGenerator::unique_person_name(&mut rng, &mut taken))
            .collect();
        let distinct: HashSet<&String> = names.iter().collect();
        assert_eq!(distinct.len(), names.len());
    }

    #[test]
    fn test_company_names_are_pt() {
        let mut rng = TableRng::new(7, 3);
        for _ in 0..20 {
            let name = NameGenerator::company_name(&mut rng);
            assert!(name.starts_with("PT "), "Company name should start with PT: {name}");
            assert_eq!(name.split(' ').count(), 4);
        }
    }

    #[test]
    fn test_site_names() {
        assert_eq!(NameGenerator::site_name(0), "Tambang A");
        assert_eq!(NameGenerator::site_name(25), "Tambang Z");
        assert_eq!(NameGenerator::site_name(26), "Tambang 27");
    }
}
