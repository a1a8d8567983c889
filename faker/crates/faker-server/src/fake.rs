//! Generators for the `@fake` directive and the default leaf values.

use rand::{seq::SliceRandom, Rng};
use serde_json::{json, Value};

/// Every generator `@fake(type:)` accepts. Also the values of the `fake__Types` enum.
pub(crate) const FAKE_TYPES: &[&str] = &[
    "zipCode",
    "city",
    "streetName",
    "streetAddress",
    "country",
    "countryCode",
    "latitude",
    "longitude",
    "colorName",
    "hexColor",
    "productName",
    "productCategory",
    "money",
    "companyName",
    "firstName",
    "lastName",
    "fullName",
    "jobTitle",
    "email",
    "phoneNumber",
    "url",
    "domainName",
    "imageUrl",
    "avatarUrl",
    "ipv4",
    "uuid",
    "word",
    "words",
    "sentence",
    "paragraph",
    "pastDate",
    "futureDate",
    "recentDate",
    "number",
    "boolean",
    "filename",
    "mimeType",
];

const WORDS: &[&str] = &[
    "lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "eiusmod",
    "tempor",
    "incididunt",
    "labore",
    "dolore",
    "magna",
    "aliqua",
    "veniam",
    "nostrud",
    "ullamco",
    "laboris",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances", "Edsger",
];

const LAST_NAMES: &[&str] = &[
    "Lovelace", "Turing", "Hopper", "Torvalds", "Hamilton", "Ritchie", "Liskov", "Thompson", "Allen", "Dijkstra",
];

const CITIES: &[&str] = &[
    "Lisbon", "Helsinki", "Oslo", "Kyoto", "Toronto", "Lagos", "Lima", "Perth", "Prague", "Dublin",
];

const COUNTRIES: &[(&str, &str)] = &[
    ("Portugal", "PT"),
    ("Finland", "FI"),
    ("Norway", "NO"),
    ("Japan", "JP"),
    ("Canada", "CA"),
    ("Nigeria", "NG"),
    ("Peru", "PE"),
    ("Australia", "AU"),
    ("Czechia", "CZ"),
    ("Ireland", "IE"),
];

const STREET_SUFFIXES: &[&str] = &["Street", "Avenue", "Road", "Lane", "Way", "Square"];

const COLORS: &[&str] = &["red", "green", "blue", "teal", "orange", "purple", "silver", "maroon"];

const PRODUCT_ADJECTIVES: &[&str] = &["Ergonomic", "Rustic", "Sleek", "Handmade", "Practical", "Small"];

const PRODUCT_MATERIALS: &[&str] = &["Wooden", "Steel", "Cotton", "Granite", "Plastic", "Rubber"];

const PRODUCT_NOUNS: &[&str] = &["Chair", "Table", "Shoes", "Keyboard", "Lamp", "Gloves", "Bike"];

const CATEGORIES: &[&str] = &["Books", "Garden", "Toys", "Electronics", "Grocery", "Outdoors"];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "and Sons", "Labs"];

const JOB_TITLES: &[&str] = &[
    "Software Engineer",
    "Product Manager",
    "Data Analyst",
    "Designer",
    "Support Specialist",
    "Account Executive",
];

const TOP_LEVEL_DOMAINS: &[&str] = &["com", "org", "net", "io", "dev"];

const EXTENSIONS: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
];

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

// 2024-01-01T00:00:00Z, the anchor dates are generated around.
const ANCHOR_MILLIS: i64 = 1_704_067_200_000;

/// Generates a value with the named `@fake` generator. Unknown names fall back to a lorem word.
pub(crate) fn fake(fake_type: &str, rng: &mut impl Rng) -> Value {
    match fake_type {
        "zipCode" => json!(format!("{:05}", rng.gen_range(0..100_000))),
        "city" => json!(pick(rng, CITIES)),
        "streetName" => json!(street_name(rng)),
        "streetAddress" => json!(format!("{} {}", rng.gen_range(1..2000), street_name(rng))),
        "country" => json!(pick(rng, COUNTRIES).0),
        "countryCode" => json!(pick(rng, COUNTRIES).1),
        "latitude" => json!(round(rng.gen_range(-90.0..90.0), 6)),
        "longitude" => json!(round(rng.gen_range(-180.0..180.0), 6)),
        "colorName" => json!(pick(rng, COLORS)),
        "hexColor" => json!(format!("#{:06x}", rng.gen_range(0..0x100_0000))),
        "productName" => json!(format!(
            "{} {} {}",
            pick(rng, PRODUCT_ADJECTIVES),
            pick(rng, PRODUCT_MATERIALS),
            pick(rng, PRODUCT_NOUNS)
        )),
        "productCategory" => json!(pick(rng, CATEGORIES)),
        "money" => json!(format!("{:.2}", rng.gen_range(1.0..1000.0))),
        "companyName" => json!(format!("{} {}", pick(rng, LAST_NAMES), pick(rng, COMPANY_SUFFIXES))),
        "firstName" => json!(pick(rng, FIRST_NAMES)),
        "lastName" => json!(pick(rng, LAST_NAMES)),
        "fullName" => json!(format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))),
        "jobTitle" => json!(pick(rng, JOB_TITLES)),
        "email" => json!(format!(
            "{}.{}@{}",
            pick(rng, FIRST_NAMES).to_lowercase(),
            pick(rng, LAST_NAMES).to_lowercase(),
            domain_name(rng)
        )),
        "phoneNumber" => json!(format!(
            "{:03}-{:03}-{:04}",
            rng.gen_range(200..1000),
            rng.gen_range(0..1000),
            rng.gen_range(0..10_000)
        )),
        "url" => json!(format!("https://{}/{}", domain_name(rng), pick(rng, WORDS))),
        "domainName" => json!(domain_name(rng)),
        "imageUrl" => json!(format!("https://picsum.photos/seed/{}/640/480", rng.gen_range(0..10_000))),
        "avatarUrl" => json!(format!("https://i.pravatar.cc/150?u={}", uuid(rng))),
        "ipv4" => json!(format!(
            "{}.{}.{}.{}",
            rng.gen_range(1..255),
            rng.gen_range(0..256),
            rng.gen_range(0..256),
            rng.gen_range(1..255)
        )),
        "uuid" => json!(uuid(rng)),
        "words" => json!(words(rng, 3)),
        "sentence" => json!(sentence(rng)),
        "paragraph" => {
            let count = rng.gen_range(3..6);
            let sentences: Vec<String> = (0..count).map(|_| sentence(rng)).collect();
            json!(sentences.join(" "))
        }
        "pastDate" => json!(date(ANCHOR_MILLIS - rng.gen_range(0..365 * DAY_MILLIS))),
        "futureDate" => json!(date(ANCHOR_MILLIS + rng.gen_range(0..365 * DAY_MILLIS))),
        "recentDate" => json!(date(ANCHOR_MILLIS - rng.gen_range(0..2 * DAY_MILLIS))),
        "number" => json!(rng.gen_range(0..100_000)),
        "boolean" => json!(rng.gen_bool(0.5)),
        "filename" => json!(format!("{}.{}", pick(rng, WORDS), pick(rng, EXTENSIONS).0)),
        "mimeType" => json!(pick(rng, EXTENSIONS).1),
        _ => json!(pick(rng, WORDS)),
    }
}

pub(crate) fn int(rng: &mut impl Rng) -> Value {
    json!(rng.gen_range(0..=100))
}

pub(crate) fn float(rng: &mut impl Rng) -> Value {
    json!(round(rng.gen_range(0.0..100.0), 2))
}

pub(crate) fn boolean(rng: &mut impl Rng) -> Value {
    json!(rng.gen_bool(0.5))
}

pub(crate) fn string(rng: &mut impl Rng) -> Value {
    json!(pick(rng, WORDS))
}

pub(crate) fn id(rng: &mut impl Rng) -> Value {
    json!(uuid(rng))
}

pub(crate) fn pick<'a, T>(rng: &mut impl Rng, values: &'a [T]) -> &'a T {
    // Every table above is non-empty.
    &values[rng.gen_range(0..values.len())]
}

fn street_name(rng: &mut impl Rng) -> String {
    format!("{} {}", pick(rng, LAST_NAMES), pick(rng, STREET_SUFFIXES))
}

fn domain_name(rng: &mut impl Rng) -> String {
    format!("{}.{}", pick(rng, WORDS), pick(rng, TOP_LEVEL_DOMAINS))
}

fn words(rng: &mut impl Rng, count: usize) -> String {
    WORDS
        .choose_multiple(rng, count)
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

fn sentence(rng: &mut impl Rng) -> String {
    let count = rng.gen_range(4..9);
    let mut sentence = words(rng, count);

    if let Some(first) = sentence.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    sentence.push('.');
    sentence
}

fn uuid(rng: &mut impl Rng) -> String {
    let bytes: [u8; 16] = rng.gen();
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();

    format!(
        "{}-{}-4{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[13..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Formats milliseconds since the Unix epoch as an RFC 3339 UTC timestamp.
fn date(millis: i64) -> String {
    let seconds = millis.div_euclid(1000);
    let days = seconds.div_euclid(86_400);
    let secs_of_day = seconds.rem_euclid(86_400);

    // Civil-from-days, proleptic Gregorian calendar.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);

    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.000Z",
        secs_of_day / 3600,
        secs_of_day % 3600 / 60,
        secs_of_day % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_generator_produces_a_value() {
        let mut rng = rand::thread_rng();

        for fake_type in FAKE_TYPES {
            assert!(!fake(fake_type, &mut rng).is_null(), "{fake_type} produced null");
        }
    }

    #[test]
    fn uuid_shape() {
        let value = uuid(&mut rand::thread_rng());
        let groups: Vec<_> = value.split('-').map(str::len).collect();

        assert_eq!(vec![8, 4, 4, 4, 12], groups);
        assert_eq!(Some('4'), value.chars().nth(14));
    }

    #[test]
    fn dates_are_rfc3339() {
        assert_eq!("2024-01-01T00:00:00.000Z", date(ANCHOR_MILLIS));
        assert_eq!("2023-12-31T23:59:59.000Z", date(ANCHOR_MILLIS - 1000));
        assert_eq!("2024-02-29T12:30:00.000Z", date(ANCHOR_MILLIS + 59 * DAY_MILLIS + 45_000_000));
    }

    #[test]
    fn defaults_stay_in_range() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let int = int(&mut rng).as_i64().unwrap();
            let float = float(&mut rng).as_f64().unwrap();

            assert!((0..=100).contains(&int));
            assert!((0.0..=100.0).contains(&float));
        }
    }
}
