//! Static city table
//!
//! Resolves free-text city names to coordinates and coordinates back to the
//! nearest known city. Matching is case- and accent-insensitive.

use crate::constants::labels::DEFAULT_COUNTRY;
use crate::coord::point::haversine_miles;
use crate::coord::Coordinates;
use crate::geo::CityLabel;
use std::collections::HashMap;

/// A known city
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct City {
    pub name: &'static str,
    pub region: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl City {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    pub fn label(&self) -> CityLabel {
        CityLabel {
            city: self.name.to_string(),
            region: Some(self.region.to_string()),
        }
    }
}

const fn city(name: &'static str, region: &'static str, lat: f64, lng: f64) -> City {
    City { name, region, lat, lng }
}

/// Cameroonian cities served by the carrier
pub const CITIES: &[City] = &[
    // Centre
    city("Yaoundé", "Centre", 3.8480, 11.5021),
    city("Mbalmayo", "Centre", 3.5167, 11.5000),
    city("Bafia", "Centre", 4.7500, 11.2333),
    city("Obala", "Centre", 4.1667, 11.5333),
    city("Akonolinga", "Centre", 3.7667, 12.2500),
    city("Eséka", "Centre", 3.6500, 10.7667),
    city("Nanga-Eboko", "Centre", 4.6833, 12.3667),
    city("Mbandjock", "Centre", 4.4500, 11.9000),
    city("Nkoteng", "Centre", 4.5167, 12.0333),
    city("Ntui", "Centre", 4.4500, 11.6333),
    city("Mfou", "Centre", 3.8667, 11.6333),
    city("Mbankomo", "Centre", 3.7833, 11.3833),
    city("Saa", "Centre", 4.3667, 11.4500),
    city("Makénéné", "Centre", 4.8333, 11.2167),
    city("Ndikiniméki", "Centre", 4.7667, 10.8333),
    city("Ngomedzap", "Centre", 3.2500, 11.2167),
    city("Minta", "Centre", 4.5833, 12.8000),
    city("Zou", "Centre", 4.8167, 11.1333),
    // Littoral
    city("Douala", "Littoral", 4.0511, 9.7679),
    city("Bonabéri", "Littoral", 4.0833, 9.6833),
    city("Nkongsamba", "Littoral", 4.9500, 9.9333),
    city("Edéa", "Littoral", 3.8000, 10.1333),
    city("Loum", "Littoral", 4.7167, 9.7333),
    city("Mbanga", "Littoral", 4.5000, 9.5667),
    city("Melong", "Littoral", 5.1167, 9.9500),
    city("Manjo", "Littoral", 4.8333, 9.8167),
    city("Yabassi", "Littoral", 4.4500, 9.9667),
    city("Dizangué", "Littoral", 3.7667, 9.9833),
    city("Dibombari", "Littoral", 4.1833, 9.6500),
    city("Ndom", "Littoral", 4.5000, 9.8167),
    city("Ngambe", "Littoral", 4.2333, 10.6167),
    city("Pouma", "Littoral", 3.5167, 10.1667),
    // West
    city("Bafoussam", "West", 5.4776, 10.4176),
    city("Foumban", "West", 5.7167, 10.9167),
    city("Mbouda", "West", 5.6333, 10.2500),
    city("Dschang", "West", 5.4500, 10.0667),
    city("Bafang", "West", 5.1500, 10.1833),
    city("Foumbot", "West", 5.5000, 10.6333),
    city("Bangangté", "West", 5.1500, 10.5167),
    city("Kékem", "West", 5.5500, 10.1167),
    city("Magba", "West", 5.9167, 10.6167),
    city("Tonga", "West", 4.9667, 10.7000),
    city("Koutaba", "West", 5.6500, 10.7500),
    city("Bandjoun", "West", 5.3500, 10.4167),
    city("Bana", "West", 5.1500, 10.2667),
    city("Bangang", "West", 5.1333, 10.5167),
    city("Bansoa", "West", 5.4500, 10.3167),
    city("Bazou", "West", 5.0667, 10.4667),
    city("Fokoué", "West", 5.5833, 10.6000),
    city("Ngou", "West", 5.2000, 10.3833),
    city("Fang", "West", 5.7000, 10.8833),
    // North-West
    city("Bamenda", "North-West", 6.1167, 10.1667),
    city("Kumbo", "North-West", 6.2000, 10.6667),
    city("Wum", "North-West", 6.3833, 10.0667),
    city("Nkambé", "North-West", 6.6167, 10.8333),
    city("Bali", "North-West", 5.8833, 10.0167),
    city("Ndop", "North-West", 6.2000, 10.4833),
    city("Fundong", "North-West", 6.2500, 10.2667),
    city("Batibo", "North-West", 6.0833, 10.0167),
    city("Bamessing", "North-West", 6.0333, 10.1500),
    city("Bamunka", "North-West", 5.9167, 10.5833),
    city("Oku", "North-West", 6.2000, 10.4667),
    // South-West
    city("Kumba", "South-West", 4.6333, 9.4500),
    city("Limbé", "South-West", 4.0242, 9.2068),
    city("Buea", "South-West", 4.1534, 9.2426),
    city("Tiko", "South-West", 4.0833, 9.3667),
    city("Muyuka", "South-West", 4.2833, 9.4167),
    city("Mamfé", "South-West", 5.7500, 9.2833),
    city("Tombel", "South-West", 4.5833, 9.6667),
    city("Fontem", "South-West", 5.4667, 9.8833),
    city("Mutengene", "South-West", 4.1000, 9.3167),
    city("Idenau", "South-West", 4.2500, 8.9833),
    city("Mundemba", "South-West", 4.9500, 8.8667),
    city("Nguti", "South-West", 5.3167, 9.4167),
    city("Bekondo", "South-West", 4.6833, 9.3167),
    city("Idabato", "South-West", 4.9000, 8.9000),
    // South
    city("Ebolowa", "South", 2.9333, 11.1500),
    city("Kribi", "South", 2.9373, 9.9077),
    city("Sangmélima", "South", 2.9333, 11.9833),
    city("Campo", "South", 2.3667, 9.8167),
    city("Lolodorf", "South", 3.2333, 10.7333),
    // East
    city("Bertoua", "East", 4.5833, 14.0833),
    city("Batouri", "East", 4.4333, 14.3667),
    city("Abong-Mbang", "East", 3.9833, 13.1833),
    city("Yokadouma", "East", 3.5167, 15.0500),
    city("Bélabo", "East", 4.9333, 13.3000),
    city("Garoua-Boulaï", "East", 5.8833, 14.5500),
    city("Doumé", "East", 4.2333, 13.4500),
    city("Ndelele", "East", 4.0333, 14.9333),
    // Adamawa
    city("Ngaoundéré", "Adamawa", 7.3167, 13.5833),
    city("Meiganga", "Adamawa", 6.5167, 14.3000),
    city("Tibati", "Adamawa", 6.4667, 12.6333),
    city("Banyo", "Adamawa", 6.7500, 11.8167),
    city("Ngaoundal", "Adamawa", 6.4500, 13.7667),
    city("Djohong", "Adamawa", 6.8333, 14.7000),
    city("Galim", "Adamawa", 6.4000, 11.4167),
    city("Kontcha", "Adamawa", 7.9833, 12.2333),
    city("Nyambaka", "Adamawa", 7.2000, 13.5833),
    // North
    city("Garoua", "North", 9.3000, 13.4000),
    city("Guider", "North", 9.9333, 13.9500),
    city("Pitoa", "North", 9.3833, 13.5333),
    city("Touboro", "North", 7.7833, 15.3667),
    city("Tcholliré", "North", 8.4000, 14.1667),
    city("Figuil", "North", 9.7667, 13.9667),
    city("Lagdo", "North", 9.0500, 13.6667),
    city("Poli", "North", 8.4833, 13.2500),
    city("Rey Bouba", "North", 8.6667, 14.1833),
    city("Gashiga", "North", 10.5167, 13.9833),
    // Far North
    city("Maroua", "Far North", 10.5956, 14.3247),
    city("Kousséri", "Far North", 12.0833, 15.0333),
    city("Yagoua", "Far North", 10.3500, 15.2333),
    city("Mokolo", "Far North", 10.7333, 13.8000),
    city("Mora", "Far North", 11.0500, 14.1333),
    city("Kaélé", "Far North", 10.1000, 14.4500),
    city("Maga", "Far North", 10.8500, 14.9333),
    city("Blangoua", "Far North", 12.2333, 14.5167),
    city("Bogo", "Far North", 10.7333, 14.6167),
    city("Gazawa", "Far North", 10.5833, 14.2000),
    city("Goulfey", "Far North", 12.0833, 14.9833),
    city("Mindif", "Far North", 10.4000, 14.4333),
    city("Guidiguis", "Far North", 10.1333, 14.7167),
];

/// Alternate spellings that do not fold onto a table entry
const ALIASES: &[(&str, &str)] = &[
    ("Yaounde Centre", "Yaoundé"),
    ("Buea Town", "Buea"),
];

/// Parsed pieces of a free-text location ("City, State, Country 12345")
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationParts {
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

/// Split free-text location input into its parts
///
/// Up to three comma-separated parts map to city, state and country. A missing
/// country defaults to Cameroon. A trailing 5-digit (or ZIP+4) token in the
/// state part is moved to `zip_code`.
pub fn parse_location_input(input: &str) -> LocationParts {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return LocationParts::default();
    }

    let parts: Vec<&str> = trimmed
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut result = LocationParts {
        city: parts.first().map(|s| s.to_string()).unwrap_or_default(),
        state: parts.get(1).map(|s| s.to_string()).unwrap_or_default(),
        country: parts.get(2).map(|s| s.to_string()).unwrap_or_default(),
        zip_code: String::new(),
    };

    if result.country.is_empty() {
        result.country = DEFAULT_COUNTRY.to_string();
    }

    let mut segments: Vec<&str> = result.state.split_whitespace().collect();
    if segments.len() > 1 {
        if let Some(last) = segments.last().copied() {
            if is_zip_code(last) {
                result.zip_code = last.to_string();
                segments.pop();
                result.state = segments.join(" ");
            }
        }
    }

    if result.zip_code.is_empty() {
        if let Some(zip) = trimmed
            .split(|c: char| !(c.is_ascii_digit() || c == '-'))
            .find(|token| is_zip_code(token))
        {
            result.zip_code = zip.to_string();
        }
    }

    result
}

fn is_zip_code(token: &str) -> bool {
    let bytes = token.as_bytes();
    let digits = |s: &[u8]| s.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        5 => digits(bytes),
        10 => digits(&bytes[..5]) && bytes[5] == b'-' && digits(&bytes[6..]),
        _ => false,
    }
}

/// Normalize a city name for lookup: lowercase, accents stripped, hyphens
/// treated as spaces, whitespace collapsed
pub fn fold_name(name: &str) -> String {
    let folded: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'à' | 'á' | 'â' | 'ä' | 'ã' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            '-' | '_' => ' ',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lookup structure over the static city table
#[derive(Debug, Clone)]
pub struct CityIndex {
    cities: Vec<City>,
    by_name: HashMap<String, usize>,
}

impl CityIndex {
    /// Build an index over the built-in table
    pub fn new() -> Self {
        Self::from_cities(CITIES.to_vec())
    }

    /// Build an index over an arbitrary table
    pub fn from_cities(cities: Vec<City>) -> Self {
        let mut by_name = HashMap::with_capacity(cities.len() + ALIASES.len());
        for (idx, city) in cities.iter().enumerate() {
            by_name.entry(fold_name(city.name)).or_insert(idx);
        }
        for (alias, target) in ALIASES {
            if let Some(&idx) = by_name.get(&fold_name(target)) {
                by_name.entry(fold_name(alias)).or_insert(idx);
            }
        }
        Self { cities, by_name }
    }

    /// Number of cities in the table
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Exact (folded) name lookup
    pub fn find(&self, name: &str) -> Option<&City> {
        self.by_name.get(&fold_name(name)).map(|&idx| &self.cities[idx])
    }

    /// Resolve free-text input ("Douala", "Douala, Littoral, CM") to a city
    ///
    /// Tries the first comma-separated part, then the whole input, then the
    /// parsed city.
    pub fn resolve_city(&self, input: &str) -> Option<&City> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.contains(',') {
            if let Some(first) = trimmed.split(',').map(str::trim).find(|p| !p.is_empty()) {
                if let Some(city) = self.find(first) {
                    return Some(city);
                }
            }
        }

        self.find(trimmed)
            .or_else(|| self.find(&parse_location_input(trimmed).city))
    }

    /// Resolve free-text input to coordinates
    pub fn resolve(&self, input: &str) -> Option<Coordinates> {
        self.resolve_city(input).map(City::coordinates)
    }

    /// Nearest city to `point` within `max_miles`
    pub fn nearest(&self, point: Coordinates, max_miles: f64) -> Option<&City> {
        self.cities
            .iter()
            .map(|c| (c, haversine_miles(point, c.coordinates())))
            .filter(|(_, d)| d.is_finite() && *d <= max_miles)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }
}

impl Default for CityIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::CoordinateResolver;
    use crate::shipment::Address;

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("Yaoundé"), "yaounde");
        assert_eq!(fold_name("  Garoua-Boulaï "), "garoua boulai");
        assert_eq!(fold_name("NANGA   EBOKO"), "nanga eboko");
    }

    #[test]
    fn test_find_accent_insensitive() {
        let index = CityIndex::new();
        let a = index.find("Yaounde").unwrap();
        let b = index.find("yaoundé").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.region, "Centre");
        assert!(index.find("Nanga Eboko").is_some());
        assert!(index.find("Atlantis").is_none());
    }

    #[test]
    fn test_resolve_comma_input() {
        let index = CityIndex::new();
        let coords = index.resolve("Douala, Littoral, CM").unwrap();
        assert_eq!(coords, Coordinates::new(4.0511, 9.7679));
    }

    #[test]
    fn test_resolve_alias() {
        let index = CityIndex::new();
        assert_eq!(index.resolve("Buea Town"), index.resolve("Buea"));
    }

    #[test]
    fn test_resolve_empty() {
        let index = CityIndex::new();
        assert!(index.resolve("").is_none());
        assert!(index.resolve("   ").is_none());
    }

    #[test]
    fn test_resolve_address() {
        let index = CityIndex::new();
        let address = Address {
            city: "Maroua".to_string(),
            ..Address::default()
        };
        assert_eq!(index.resolve_address(&address), Some(Coordinates::new(10.5956, 14.3247)));
    }

    #[test]
    fn test_nearest_city() {
        let index = CityIndex::new();
        // A few km outside Douala
        let city = index.nearest(Coordinates::new(4.06, 9.78), 30.0).unwrap();
        assert_eq!(city.name, "Douala");
    }

    #[test]
    fn test_nearest_city_out_of_range() {
        let index = CityIndex::new();
        // Middle of the Atlantic
        assert!(index.nearest(Coordinates::new(0.0, -30.0), 30.0).is_none());
    }

    #[test]
    fn test_table_has_no_duplicate_names() {
        let index = CityIndex::new();
        let unique: std::collections::HashSet<_> =
            CITIES.iter().map(|c| fold_name(c.name)).collect();
        assert_eq!(unique.len(), index.len());
    }

    #[test]
    fn test_parse_location_input() {
        let parts = parse_location_input("Douala, Littoral");
        assert_eq!(parts.city, "Douala");
        assert_eq!(parts.state, "Littoral");
        assert_eq!(parts.country, "CM");
        assert!(parts.zip_code.is_empty());
    }

    #[test]
    fn test_parse_location_input_zip() {
        let parts = parse_location_input("Austin, TX 78701, US");
        assert_eq!(parts.city, "Austin");
        assert_eq!(parts.state, "TX");
        assert_eq!(parts.country, "US");
        assert_eq!(parts.zip_code, "78701");

        let parts = parse_location_input("Austin 78701-1234");
        assert_eq!(parts.zip_code, "78701-1234");
    }

    #[test]
    fn test_parse_location_input_empty() {
        assert_eq!(parse_location_input(""), LocationParts::default());
    }
}
