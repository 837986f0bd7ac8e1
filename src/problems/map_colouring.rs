//! Map-colouring problem builder.
//!
//! Regions and colour names are opaque strings, interned to dense ids
//! in side tables at build time; the solver core only ever sees
//! integers. Opaque universes use the hash-set domain representation.

use std::collections::HashMap;

use crate::{
    error::Result,
    solver::{
        constraint::ConstraintKind,
        domain::Universe,
        engine::VariableId,
        problem::{Problem, SolverConfig},
    },
};

#[derive(Debug, Clone)]
pub struct MapColouring {
    colours: Vec<String>,
    regions: Vec<String>,
    region_ids: HashMap<String, usize>,
    borders: Vec<(usize, usize)>,
}

impl MapColouring {
    pub fn new<I, S>(colours: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            colours: colours.into_iter().map(Into::into).collect(),
            regions: Vec::new(),
            region_ids: HashMap::new(),
            borders: Vec::new(),
        }
    }

    /// Interns a region name, returning its dense id.
    pub fn region(&mut self, name: &str) -> usize {
        if let Some(&id) = self.region_ids.get(name) {
            return id;
        }
        let id = self.regions.len();
        self.regions.push(name.to_string());
        self.region_ids.insert(name.to_string(), id);
        id
    }

    /// Declares that two regions share a border and must differ.
    pub fn border(&mut self, a: &str, b: &str) {
        let a = self.region(a);
        let b = self.region(b);
        self.borders.push((a, b));
    }

    pub fn colour_name(&self, id: u32) -> &str {
        &self.colours[id as usize]
    }

    pub fn region_name(&self, id: VariableId) -> &str {
        &self.regions[id as usize]
    }

    /// Builds the CSP: one variable per region over the interned colour
    /// universe, one binary not-equal per border.
    pub fn problem(&self, config: SolverConfig) -> Result<Problem> {
        let mut problem = Problem::new(config);
        for name in &self.regions {
            problem.add_variable(name.clone(), Universe::opaque(self.colours.len() as u32))?;
        }
        for &(a, b) in &self.borders {
            problem.add_constraint(vec![a as u32, b as u32], ConstraintKind::NotEqual)?;
        }
        Ok(problem)
    }

    /// Translates a solution vector back to `(region, colour)` names.
    pub fn decode<'a>(&'a self, solution: &[u32]) -> Vec<(&'a str, &'a str)> {
        solution
            .iter()
            .enumerate()
            .map(|(region, &colour)| {
                (self.regions[region].as_str(), self.colour_name(colour))
            })
            .collect()
    }

    /// The textbook Australia instance: seven regions, three colours,
    /// nine borders, and isolated Tasmania.
    pub fn australia() -> Self {
        let mut map = Self::new(["red", "green", "blue"]);
        for name in ["WA", "NT", "SA", "Q", "NSW", "V", "T"] {
            map.region(name);
        }
        map.border("SA", "WA");
        map.border("SA", "NT");
        map.border("SA", "Q");
        map.border("SA", "NSW");
        map.border("SA", "V");
        map.border("Q", "NT");
        map.border("Q", "NSW");
        map.border("NSW", "V");
        map.border("WA", "NT");
        map
    }
}
