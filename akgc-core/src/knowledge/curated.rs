//! Hand-authored fact table for common entities.
//!
//! Keys are canonical entity names as produced by normalization. Within an
//! entry, the first fact is the one correction prefers when nothing more
//! specific matches.

const CURATED: &[(&str, &[&str])] = &[
    // geography: countries
    (
        "France",
        &[
            "France is a country in Western Europe.",
            "The capital of France is Paris.",
            "France is known for its culture, cuisine, and landmarks like the Eiffel Tower.",
            "France is a member of the European Union and NATO.",
        ],
    ),
    (
        "India",
        &[
            "India is a country in South Asia.",
            "The capital of India is New Delhi.",
            "India is the world's largest democracy and second most populous country.",
            "India gained independence from British rule in 1947.",
        ],
    ),
    (
        "USA",
        &[
            "The United States is a country in North America.",
            "The capital of the USA is Washington D.C.",
            "The USA consists of 50 states and various territories.",
            "The USA is known for its diverse culture and economic power.",
        ],
    ),
    (
        "China",
        &[
            "China is a country in East Asia.",
            "The capital of China is Beijing.",
            "China is the world's most populous country.",
            "China has the world's second-largest economy.",
        ],
    ),
    (
        "Japan",
        &[
            "Japan is an island country in East Asia.",
            "The capital of Japan is Tokyo.",
            "Japan is known for its technology and cultural exports.",
            "Japan consists of four main islands: Honshu, Hokkaido, Kyushu, and Shikoku.",
        ],
    ),
    (
        "Russia",
        &[
            "Russia is the largest country in the world by land area.",
            "The capital of Russia is Moscow.",
            "Russia spans eleven time zones.",
            "Russia is located in both Europe and Asia.",
        ],
    ),
    (
        "Germany",
        &[
            "Germany is a country in Central Europe.",
            "The capital of Germany is Berlin.",
            "Germany is the most populous member state of the European Union.",
            "Germany is known for its engineering and automotive industry.",
        ],
    ),
    (
        "United Kingdom",
        &[
            "The United Kingdom is a country in Northwestern Europe.",
            "The capital of the United Kingdom is London.",
            "The United Kingdom consists of England, Scotland, Wales, and Northern Ireland.",
        ],
    ),
    // geography: cities
    (
        "Paris",
        &[
            "Paris is the capital and largest city of France.",
            "Paris is known as the 'City of Light'.",
            "Famous landmarks include the Eiffel Tower and Louvre Museum.",
            "Paris is located on the Seine River.",
        ],
    ),
    (
        "Tokyo",
        &[
            "Tokyo is the capital of Japan.",
            "Tokyo is one of the world's most populous metropolitan areas.",
            "Tokyo hosted the Summer Olympics in 1964 and 2021.",
            "Tokyo is a major global financial center.",
        ],
    ),
    (
        "London",
        &[
            "London is the capital and largest city of England and the United Kingdom.",
            "London is a major global city and financial center.",
            "Famous landmarks include Big Ben and the Tower of London.",
            "London is located on the River Thames.",
        ],
    ),
    (
        "Beijing",
        &[
            "Beijing is the capital of China.",
            "Beijing is one of the most populous cities in the world.",
            "Beijing hosted the Summer Olympics in 2008 and Winter Olympics in 2022.",
            "Beijing is the political and cultural center of China.",
        ],
    ),
    // science
    (
        "Water",
        &[
            "Water is made of hydrogen and oxygen.",
            "Water is a chemical compound with the formula H2O.",
            "Water is essential for all known forms of life.",
            "Water covers about 71% of Earth's surface.",
        ],
    ),
    (
        "Oxygen",
        &[
            "Oxygen is a chemical element with symbol O and atomic number 8.",
            "Oxygen is essential for respiration in most living organisms.",
            "Oxygen makes up about 21% of Earth's atmosphere.",
            "Oxygen was discovered independently by Carl Wilhelm Scheele and Joseph Priestley.",
        ],
    ),
    (
        "Carbon",
        &[
            "Carbon is a chemical element with symbol C and atomic number 6.",
            "Carbon is the basis of all organic compounds.",
            "Carbon exists in several forms including diamond and graphite.",
        ],
    ),
    (
        "Gold",
        &[
            "Gold is a chemical element with symbol Au and atomic number 79.",
            "Gold is a precious metal known for its resistance to corrosion.",
            "Gold has been used as currency and jewelry for thousands of years.",
            "Gold is highly valued for its rarity and beauty.",
        ],
    ),
    (
        "Silver",
        &[
            "Silver is a chemical element with symbol Ag and atomic number 47.",
            "Silver is known for its high electrical and thermal conductivity.",
            "Silver has antimicrobial properties.",
            "Silver has been used in coins, jewelry, and photography.",
        ],
    ),
    (
        "Iron",
        &[
            "Iron is a chemical element with symbol Fe and atomic number 26.",
            "Iron is the most common element on Earth by mass.",
            "Iron is essential for human health as part of hemoglobin.",
            "Iron is the primary component of steel.",
        ],
    ),
    // history
    (
        "World War II",
        &[
            "World War II ended in 1945.",
            "World War II lasted from 1939 to 1945.",
            "World War II was the deadliest conflict in human history.",
            "World War II involved most of the world's nations.",
        ],
    ),
    (
        "World War I",
        &[
            "World War I lasted from 1914 to 1918.",
            "World War I was also known as the Great War.",
            "The war ended with the Armistice of Compiègne on November 11, 1918.",
            "World War I resulted in significant political changes in Europe.",
        ],
    ),
    (
        "Napoleon Bonaparte",
        &[
            "Napoleon Bonaparte was a French military and political leader.",
            "Napoleon was Emperor of France from 1804 to 1814.",
            "Napoleon was born in Corsica in 1769.",
            "Napoleon is considered one of the greatest military commanders in history.",
        ],
    ),
    (
        "Albert Einstein",
        &[
            "Albert Einstein was a German-born theoretical physicist.",
            "Einstein developed the theory of relativity.",
            "Einstein won the Nobel Prize in Physics in 1921.",
            "Einstein was born in Ulm, Germany in 1879.",
        ],
    ),
    (
        "Julius Caesar",
        &[
            "Julius Caesar was a Roman general and statesman.",
            "Caesar played a critical role in the events that led to the demise of the Roman Republic.",
            "Caesar was assassinated on the Ides of March (March 15) in 44 BC.",
            "Augustus, not Julius Caesar, was the first Roman Emperor.",
        ],
    ),
    // technology
    (
        "Python",
        &[
            "Python is an interpreted programming language.",
            "Python was created by Guido van Rossum and first released in 1991.",
            "Python is known for its simplicity and readability.",
            "Python is widely used in web development, data science, and artificial intelligence.",
        ],
    ),
    (
        "Bitcoin",
        &[
            "Bitcoin is a decentralized digital cryptocurrency.",
            "Bitcoin was created in 2009 by an unknown person using the pseudonym Satoshi Nakamoto.",
            "Bitcoin operates on a peer-to-peer network without a central authority.",
            "Bitcoin transactions are recorded on a public ledger called a blockchain.",
        ],
    ),
    (
        "Quantum Computing",
        &[
            "Quantum computing uses quantum mechanical phenomena to process information.",
            "Quantum computers can potentially solve certain problems exponentially faster than classical computers.",
            "Quantum computing is still in early stages of development.",
            "Major tech companies are investing heavily in quantum computing research.",
        ],
    ),
    // medicine
    (
        "Heart",
        &[
            "The human heart has four chambers: two atria and two ventricles.",
            "The heart pumps blood through the circulatory system.",
            "The heart beats approximately 100,000 times per day.",
            "Heart disease is a leading cause of death worldwide.",
        ],
    ),
    (
        "Insulin",
        &[
            "Insulin is a hormone produced by the beta cells of the pancreas.",
            "Insulin helps regulate blood glucose levels.",
            "Insulin was discovered by Frederick Banting and Charles Best in 1921.",
            "Diabetes occurs when the body cannot produce or properly use insulin.",
        ],
    ),
    (
        "Common Cold",
        &[
            "The common cold is caused by viruses, not bacteria.",
            "Rhinoviruses are the most common cause of the common cold.",
            "There is no cure for the common cold, only symptom management.",
            "The common cold is highly contagious and spreads through respiratory droplets.",
        ],
    ),
    // astronomy
    (
        "Sun",
        &[
            "The Sun is the star at the center of our solar system.",
            "The Sun rises in the east and sets in the west.",
            "The Sun is approximately 4.6 billion years old.",
            "The Sun's energy comes from nuclear fusion in its core.",
        ],
    ),
    (
        "Moon",
        &[
            "The Moon is Earth's only natural satellite.",
            "The Moon orbits around the Earth.",
            "The Moon influences Earth's tides through gravitational forces.",
            "The Moon was likely formed from debris after a Mars-sized object collided with Earth.",
        ],
    ),
    (
        "Earth",
        &[
            "Earth is the third planet from the Sun.",
            "Earth is the only known planet with life.",
            "Earth has one natural satellite, the Moon.",
            "Earth's atmosphere is composed of approximately 78% nitrogen and 21% oxygen.",
        ],
    ),
    (
        "Mars",
        &[
            "Mars is the fourth planet from the Sun.",
            "Mars is known as the 'Red Planet' due to iron oxide on its surface.",
            "Mars has two small moons: Phobos and Deimos.",
        ],
    ),
];

/// Look up curated facts: exact key, then case-insensitive key, then
/// (when enabled) substring containment in either direction.
///
/// The substring tier ignores entities shorter than 3 characters and keys
/// of 3 characters or fewer.
pub fn curated_facts(entity: &str, substring_match: bool) -> Option<Vec<String>> {
    if let Some((_, facts)) = CURATED.iter().find(|(key, _)| *key == entity) {
        return Some(owned(facts));
    }

    let lower = entity.trim().to_lowercase();
    if let Some((_, facts)) = CURATED.iter().find(|(key, _)| key.to_lowercase() == lower) {
        return Some(owned(facts));
    }

    if !substring_match || lower.chars().count() < 3 {
        return None;
    }
    CURATED
        .iter()
        .find(|(key, _)| {
            let key = key.to_lowercase();
            key.chars().count() > 3 && (key.contains(&lower) || lower.contains(&key))
        })
        .map(|(_, facts)| owned(facts))
}

fn owned(facts: &[&str]) -> Vec<String> {
    facts.iter().map(|f| f.to_string()).collect()
}

/// Canonical names covered by the curated table, in table order.
pub fn curated_entities() -> impl Iterator<Item = &'static str> {
    CURATED.iter().map(|(key, _)| *key)
}
