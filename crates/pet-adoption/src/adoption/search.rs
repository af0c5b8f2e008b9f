use super::domain::Pet;

/// Predicate used by the admin search screen. Substring matches are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PetQuery {
    NameContains(String),
    BreedContains(String),
    /// Inclusive on both ends; `min > max` matches nothing.
    AgeRange { min: u32, max: u32 },
}

impl PetQuery {
    pub fn matches(&self, pet: &Pet) -> bool {
        match self {
            PetQuery::NameContains(needle) => pet.name.contains(needle.as_str()),
            PetQuery::BreedContains(needle) => pet.breed.contains(needle.as_str()),
            PetQuery::AgeRange { min, max } => (*min..=*max).contains(&pet.age),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(name: &str, breed: &str, age: u32) -> Pet {
        Pet::new(name, breed, age, false).expect("valid pet")
    }

    #[test]
    fn name_and_breed_queries_match_substrings() {
        let rex = pet("Rex", "Labrador Retriever", 3);

        assert!(PetQuery::NameContains("Re".to_string()).matches(&rex));
        assert!(PetQuery::BreedContains("Retriever".to_string()).matches(&rex));
        assert!(!PetQuery::NameContains("rex".to_string()).matches(&rex));
        assert!(!PetQuery::BreedContains("Poodle".to_string()).matches(&rex));
    }

    #[test]
    fn age_range_is_inclusive() {
        let query = PetQuery::AgeRange { min: 2, max: 4 };
        assert!(query.matches(&pet("A", "B", 2)));
        assert!(query.matches(&pet("A", "B", 4)));
        assert!(!query.matches(&pet("A", "B", 5)));
        assert!(!PetQuery::AgeRange { min: 4, max: 2 }.matches(&pet("A", "B", 3)));
    }
}
