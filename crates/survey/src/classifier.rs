use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vasini_advice::PersonalityType;

use crate::answer::AnswerSet;
use crate::catalog::Catalog;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Every type is present, zero counts included.
    pub type_counts: BTreeMap<PersonalityType, u32>,
    pub primary: PersonalityType,
    pub secondary: PersonalityType,
}

impl Classification {
    pub fn count(&self, ty: PersonalityType) -> u32 {
        self.type_counts.get(&ty).copied().unwrap_or(0)
    }
}

/// Tally inventory choices into type buckets.
///
/// Only inventory questions are counted; demo answers and answers to unknown
/// question ids are ignored.  Types are ranked by count, highest first, with
/// ties broken by [`PersonalityType`] declaration order.
pub fn classify(catalog: &Catalog, answers: &AnswerSet) -> Classification {
    let mut type_counts: BTreeMap<PersonalityType, u32> =
        PersonalityType::ALL.into_iter().map(|ty| (ty, 0)).collect();

    for question in catalog.list_inventory_questions() {
        let Some(key) = answers.choice(&question.id) else {
            continue;
        };
        if let Some(option) = question.option(key) {
            *type_counts.entry(option.leans).or_default() += 1;
        }
    }

    let mut ranked: Vec<(PersonalityType, u32)> =
        type_counts.iter().map(|(ty, count)| (*ty, *count)).collect();
    ranked.sort_by_key(|(ty, count)| (Reverse(*count), *ty));

    Classification {
        primary: ranked[0].0,
        secondary: ranked[1].0,
        type_counts,
    }
}
