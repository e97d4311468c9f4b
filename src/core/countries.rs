//! Export destination catalog and the multi-select used by the search form.

use crate::utils::error::{LookupError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    pub name: &'static str,
    /// ISO 3166-1 alpha-2
    pub code: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegionalBloc {
    pub label: &'static str,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    /// Member ISO codes.
    pub members: &'static [&'static str],
}

const fn country(name: &'static str, code: &'static str) -> Country {
    Country {
        name,
        code,
        aliases: &[],
    }
}

pub static COUNTRIES: &[Country] = &[
    country("Australia", "AU"),
    country("Austria", "AT"),
    country("Belgium", "BE"),
    country("Brazil", "BR"),
    country("Brunei", "BN"),
    country("Bulgaria", "BG"),
    country("Cambodia", "KH"),
    country("Canada", "CA"),
    country("Chile", "CL"),
    country("China", "CN"),
    country("Croatia", "HR"),
    country("Cyprus", "CY"),
    Country {
        name: "Czechia",
        code: "CZ",
        aliases: &["Czech Republic"],
    },
    country("Denmark", "DK"),
    country("Estonia", "EE"),
    country("Finland", "FI"),
    country("France", "FR"),
    country("Germany", "DE"),
    country("Greece", "GR"),
    country("Hungary", "HU"),
    country("India", "IN"),
    country("Indonesia", "ID"),
    country("Ireland", "IE"),
    country("Italy", "IT"),
    country("Japan", "JP"),
    country("Laos", "LA"),
    country("Latvia", "LV"),
    country("Lithuania", "LT"),
    country("Luxembourg", "LU"),
    country("Malaysia", "MY"),
    country("Malta", "MT"),
    country("Mexico", "MX"),
    Country {
        name: "Myanmar",
        code: "MM",
        aliases: &["Burma"],
    },
    country("Netherlands", "NL"),
    country("New Zealand", "NZ"),
    country("Norway", "NO"),
    country("Philippines", "PH"),
    country("Poland", "PL"),
    country("Portugal", "PT"),
    country("Romania", "RO"),
    country("Saudi Arabia", "SA"),
    country("Singapore", "SG"),
    country("Slovakia", "SK"),
    country("Slovenia", "SI"),
    country("South Africa", "ZA"),
    Country {
        name: "South Korea",
        code: "KR",
        aliases: &["Korea"],
    },
    country("Spain", "ES"),
    country("Sweden", "SE"),
    country("Switzerland", "CH"),
    country("Taiwan", "TW"),
    country("Thailand", "TH"),
    Country {
        name: "Turkey",
        code: "TR",
        aliases: &["Turkiye"],
    },
    Country {
        name: "United Arab Emirates",
        code: "AE",
        aliases: &["UAE"],
    },
    Country {
        name: "United Kingdom",
        code: "GB",
        aliases: &["UK", "Great Britain"],
    },
    Country {
        name: "United States",
        code: "US",
        aliases: &["USA", "United States of America"],
    },
    Country {
        name: "Vietnam",
        code: "VN",
        aliases: &["Viet Nam"],
    },
];

pub static BLOCS: &[RegionalBloc] = &[
    RegionalBloc {
        label: "European Union",
        aliases: &["EU"],
        members: &[
            "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE",
            "IT", "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
        ],
    },
    RegionalBloc {
        label: "ASEAN",
        aliases: &["Association of Southeast Asian Nations"],
        members: &["BN", "KH", "ID", "LA", "MY", "MM", "PH", "SG", "TH", "VN"],
    },
    RegionalBloc {
        label: "USMCA",
        aliases: &["NAFTA", "North America"],
        members: &["US", "CA", "MX"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Country(&'static Country),
    Bloc(&'static RegionalBloc),
}

pub fn find_country(label: &str) -> Option<&'static Country> {
    let label = label.trim();
    COUNTRIES.iter().find(|c| {
        c.name.eq_ignore_ascii_case(label)
            || c.code.eq_ignore_ascii_case(label)
            || c.aliases.iter().any(|a| a.eq_ignore_ascii_case(label))
    })
}

pub fn find_bloc(label: &str) -> Option<&'static RegionalBloc> {
    let label = label.trim();
    BLOCS.iter().find(|b| {
        b.label.eq_ignore_ascii_case(label) || b.aliases.iter().any(|a| a.eq_ignore_ascii_case(label))
    })
}

/// 國家優先於區域組織，避免 "US" 這類代碼被誤判
pub fn resolve(label: &str) -> Result<Destination> {
    if let Some(country) = find_country(label) {
        return Ok(Destination::Country(country));
    }
    if let Some(bloc) = find_bloc(label) {
        return Ok(Destination::Bloc(bloc));
    }
    Err(LookupError::UnknownCountry {
        label: label.trim().to_string(),
    })
}

pub fn blocs_containing(code: &str) -> impl Iterator<Item = &'static RegionalBloc> + '_ {
    BLOCS
        .iter()
        .filter(move |bloc| bloc.members.iter().any(|m| m.eq_ignore_ascii_case(code)))
}

/// Selected destinations. Only member countries are stored; a bloc's
/// umbrella label is selected exactly when all of its members are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountrySelection {
    codes: BTreeSet<&'static str>,
}

impl CountrySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::new();
        for label in labels {
            selection.select(label.as_ref())?;
        }
        Ok(selection)
    }

    pub fn select(&mut self, label: &str) -> Result<()> {
        match resolve(label)? {
            Destination::Country(country) => {
                self.codes.insert(country.code);
            }
            Destination::Bloc(bloc) => {
                self.codes.extend(bloc.members.iter().copied());
            }
        }
        Ok(())
    }

    pub fn deselect(&mut self, label: &str) -> Result<()> {
        match resolve(label)? {
            Destination::Country(country) => {
                self.codes.remove(country.code);
            }
            Destination::Bloc(bloc) => {
                for member in bloc.members {
                    self.codes.remove(member);
                }
            }
        }
        Ok(())
    }

    /// Flips a country. A bloc label selects all members unless all are
    /// already selected, in which case it clears them.
    pub fn toggle(&mut self, label: &str) -> Result<()> {
        let destination = resolve(label)?;
        let currently_selected = self.contains(destination);
        tracing::debug!("Toggling {} (selected: {})", label, currently_selected);

        if currently_selected {
            self.deselect(label)
        } else {
            self.select(label)
        }
    }

    pub fn is_selected(&self, label: &str) -> bool {
        resolve(label).map(|d| self.contains(d)).unwrap_or(false)
    }

    fn contains(&self, destination: Destination) -> bool {
        match destination {
            Destination::Country(country) => self.codes.contains(country.code),
            Destination::Bloc(bloc) => bloc.members.iter().all(|m| self.codes.contains(m)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn clear(&mut self) {
        self.codes.clear();
    }

    /// Selected countries in catalog (alphabetical) order.
    pub fn countries(&self) -> Vec<&'static Country> {
        COUNTRIES
            .iter()
            .filter(|c| self.codes.contains(c.code))
            .collect()
    }

    /// Labels shown as checked: every selected country plus complete blocs.
    pub fn selected_labels(&self) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = BLOCS
            .iter()
            .filter(|b| self.contains(Destination::Bloc(*b)))
            .map(|b| b.label)
            .collect();
        labels.extend(self.countries().into_iter().map(|c| c.name));
        labels
    }

    /// ISO codes for the map view.
    pub fn highlighted_codes(&self) -> Vec<&'static str> {
        self.codes.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_consistent() {
        for bloc in BLOCS {
            for member in bloc.members {
                assert!(
                    find_country(member).is_some(),
                    "{} member {} missing from catalog",
                    bloc.label,
                    member
                );
            }
        }
        let codes: BTreeSet<_> = COUNTRIES.iter().map(|c| c.code).collect();
        assert_eq!(codes.len(), COUNTRIES.len());
    }

    #[test]
    fn test_resolve_by_name_code_and_alias() {
        assert_eq!(find_country("united states").unwrap().code, "US");
        assert_eq!(find_country("usa").unwrap().code, "US");
        assert_eq!(find_country(" jp ").unwrap().name, "Japan");
        assert_eq!(find_bloc("eu").unwrap().label, "European Union");
        assert!(matches!(resolve("Atlantis"), Err(LookupError::UnknownCountry { .. })));
    }

    #[test]
    fn test_toggle_country_twice_restores_selection() {
        let mut selection = CountrySelection::from_labels(["Japan", "Germany"]).unwrap();
        let before = selection.clone();

        selection.toggle("Canada").unwrap();
        assert!(selection.is_selected("Canada"));
        selection.toggle("Canada").unwrap();
        assert_eq!(selection, before);

        selection.toggle("Japan").unwrap();
        assert!(!selection.is_selected("Japan"));
        selection.toggle("Japan").unwrap();
        assert_eq!(selection, before);
    }

    #[test]
    fn test_bloc_toggle_selects_and_clears_members() {
        let mut selection = CountrySelection::new();
        selection.toggle("USMCA").unwrap();
        assert_eq!(selection.highlighted_codes(), vec!["CA", "MX", "US"]);
        assert!(selection.is_selected("USMCA"));

        selection.toggle("USMCA").unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_partial_bloc_toggle_completes_it() {
        let mut selection = CountrySelection::from_labels(["Mexico"]).unwrap();
        selection.toggle("USMCA").unwrap();
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_umbrella_label_follows_members() {
        let mut selection = CountrySelection::new();
        let asean = find_bloc("ASEAN").unwrap();

        for (index, member) in asean.members.iter().enumerate() {
            assert!(!selection.is_selected("ASEAN"));
            selection.toggle(member).unwrap();
            if index + 1 < asean.members.len() {
                assert!(!selection.selected_labels().contains(&"ASEAN"));
            }
        }
        assert!(selection.is_selected("ASEAN"));
        assert_eq!(selection.selected_labels()[0], "ASEAN");

        selection.toggle("Singapore").unwrap();
        assert!(!selection.is_selected("ASEAN"));
        assert!(!selection.selected_labels().contains(&"ASEAN"));
    }

    #[test]
    fn test_countries_are_listed_alphabetically() {
        let selection = CountrySelection::from_labels(["Vietnam", "Brazil", "Japan"]).unwrap();
        let names: Vec<_> = selection.countries().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Brazil", "Japan", "Vietnam"]);
    }
}
