//! Aggregate statistics over a list of tracked cities.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::reference::{CityData, ReferenceData};
use crate::{BrazilianState, CityKey, TrackedCity};

/// Totals for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateBreakdown {
    /// State.
    pub state: BrazilianState,
    /// Sum of tracked city areas in the state.
    pub total_area_km2: f64,
    /// Territorial area of the state (0 when unknown).
    pub state_area_km2: f64,
    /// `total_area_km2` as a percentage of the state, 0 when the state area
    /// is unknown.
    pub percentage: f64,
    /// Number of tracked cities.
    pub city_count: usize,
    /// Names of the tracked cities, in list order.
    pub cities: Vec<String>,
}

/// Highest and lowest value of an indicator, with every city sharing each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    /// Largest value.
    pub max: f64,
    /// Cities at the largest value.
    pub max_cities: Vec<CityKey>,
    /// Smallest value.
    pub min: f64,
    /// Cities at the smallest value.
    pub min_cities: Vec<CityKey>,
}

impl Extremes {
    fn over(cities: &[&CityData], value: impl Fn(&CityData) -> f64) -> Option<Self> {
        let values: Vec<f64> = cities.iter().map(|city| value(city)).collect();
        let max = values.iter().copied().reduce(f64::max)?;
        let min = values.iter().copied().reduce(f64::min)?;
        let at = |target: f64| {
            cities
                .iter()
                .zip(&values)
                .filter(|(_, v)| **v == target)
                .map(|(city, _)| city.key())
                .collect()
        };
        Some(Self {
            max,
            max_cities: at(max),
            min,
            min_cities: at(min),
        })
    }
}

/// Indicators that need the IBGE reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorStats {
    /// Most populous city (2024 estimate).
    pub most_populous: CityData,
    /// Least populous city (2024 estimate).
    pub least_populous: CityData,
    /// Highest density (2022).
    pub densest: CityData,
    /// Lowest density (2022).
    pub sparsest: CityData,
    /// Schooling rate ages 6 to 14.
    pub schooling: Extremes,
    /// Human development index.
    pub idhm: Extremes,
    /// GDP per capita.
    pub gdp_per_capita: Extremes,
}

/// Everything the statistics view shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityStatistics {
    /// Number of tracked cities.
    pub city_count: usize,
    /// Sum of areas.
    pub total_area_km2: f64,
    /// Share of Brazil's territory, in percent.
    pub brazil_percentage: f64,
    /// Per-state totals sorted by percentage, largest first.
    pub by_state: Vec<StateBreakdown>,
    /// Largest city by area.
    pub largest_by_area: Option<TrackedCity>,
    /// Smallest city by area.
    pub smallest_by_area: Option<TrackedCity>,
    /// Indicator extremes, `None` if no tracked city is in the reference data.
    pub indicators: Option<IndicatorStats>,
}

impl CityStatistics {
    /// Compute statistics for `cities`.
    #[must_use]
    pub fn compute(cities: &[TrackedCity], reference: &ReferenceData) -> Self {
        let total_area_km2: f64 = cities.iter().map(|c| c.area_km2).sum();
        let brazil_percentage = if total_area_km2 > 0.0 {
            total_area_km2 / reference.country_area() * 100.0
        } else {
            0.0
        };

        let mut grouped: BTreeMap<BrazilianState, (f64, Vec<String>)> = BTreeMap::new();
        for city in cities {
            let entry = grouped.entry(city.state_name).or_default();
            entry.0 += city.area_km2;
            entry.1.push(city.city_name.clone());
        }
        let mut by_state: Vec<StateBreakdown> = grouped
            .into_iter()
            .map(|(state, (total, names))| {
                let state_area = reference.state_area(state);
                StateBreakdown {
                    state,
                    total_area_km2: total,
                    state_area_km2: state_area,
                    percentage: if state_area > 0.0 {
                        total / state_area * 100.0
                    } else {
                        0.0
                    },
                    city_count: names.len(),
                    cities: names,
                }
            })
            .collect();
        by_state.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

        let largest_by_area = cities
            .iter()
            .max_by(|a, b| a.area_km2.total_cmp(&b.area_km2))
            .cloned();
        let smallest_by_area = cities
            .iter()
            .min_by(|a, b| a.area_km2.total_cmp(&b.area_km2))
            .cloned();

        let joined: Vec<&CityData> = cities
            .iter()
            .filter_map(|city| reference.city(&city.city_name, city.state_name))
            .collect();

        Self {
            city_count: cities.len(),
            total_area_km2,
            brazil_percentage,
            by_state,
            largest_by_area,
            smallest_by_area,
            indicators: indicators(&joined),
        }
    }

    /// Pie-chart series: `(state, area)` in breakdown order.
    #[must_use]
    pub fn pie_series(&self) -> Vec<(BrazilianState, f64)> {
        self.by_state
            .iter()
            .map(|s| (s.state, s.total_area_km2))
            .collect()
    }
}

fn indicators(joined: &[&CityData]) -> Option<IndicatorStats> {
    let population = |c: &CityData| c.populacao_estimada_censo_2024;
    let density = |c: &CityData| c.densidade_demografica_2022;

    Some(IndicatorStats {
        most_populous: extreme(joined, population, true)?,
        least_populous: extreme(joined, population, false)?,
        densest: extreme(joined, density, true)?,
        sparsest: extreme(joined, density, false)?,
        schooling: Extremes::over(joined, |c| c.escolarizacao_6a14_2022)?,
        idhm: Extremes::over(joined, |c| c.idhm_2010)?,
        gdp_per_capita: Extremes::over(joined, |c| c.pib_per_capita_2020)?,
    })
}

fn extreme(cities: &[&CityData], value: impl Fn(&CityData) -> f64, largest: bool) -> Option<CityData> {
    let compare = |a: &&&CityData, b: &&&CityData| value(a).total_cmp(&value(b));
    let found = if largest {
        cities.iter().max_by(compare)
    } else {
        cities.iter().min_by(compare)
    };
    found.map(|city| (*city).clone())
}
