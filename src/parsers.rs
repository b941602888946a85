use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use log::warn;
use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit0, multispace1},
    combinator::{map_res, opt},
    multi::separated_list0,
    number::complete::double,
    sequence::preceded,
    IResult, Parser,
};

use crate::{
    error::ConfigError,
    reaction::{PartnerVec, Reaction},
    substance::{Substance, SubstanceKind},
    substance_table::SubstanceTable,
};

/// Which part of the two-section configuration format a line belongs to.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
enum Section {
    /// Everything before the first header is comment.
    #[default]
    Prolog,
    Substances,
    Reactions,
}

/// A parser for the reaction configuration format:
///
/// ```ignore
/// # any prolog comments
/// [substances]
/// Ar     isotropic 2.5e10
/// He_ion discrete  4.0 1.0
/// Ar_ion discrete  40.0 1.0
/// [reactions]
/// He_ion + 2Ar => Ar_ion ; 3.2e5 ; 0.1
/// ```
///
/// Every parsed rate constant is divided by the rate divisor supplied at
/// construction (e.g. 1e6 to convert s^-1 rates into the engine's
/// microsecond basis).
#[derive(Debug)]
pub struct ConfigParser {
    rate_divisor: f64,
    substances: SubstanceTable,
    reactions: Vec<Reaction>,
    section: Section,
    lineno: usize,
}

/// A parser for an identifier over `[A-Za-z0-9_-]`.
fn identifier(data: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-').parse(data)
}

/// Parses a substance line of the form `name kind [num1] [num2]`.
fn parse_substance_line(data: &str) -> IResult<&str, (&str, &str, Option<f64>, Option<f64>)> {
    (
        identifier,
        preceded(multispace1, identifier),
        opt(preceded(multispace1, double)),
        opt(preceded(multispace1, double)),
    )
        .parse(data)
}

/// Parses a partner term of the form `2A`, with the multiplier defaulting to 1.
fn parse_partner(data: &str) -> IResult<&str, (u32, &str)> {
    let (rem, factor) = map_res(digit0, |s: &str| {
        if s.is_empty() {
            Ok(1)
        } else {
            s.parse::<u32>()
        }
    })
    .parse(data)?;
    let (rem, name) = identifier(rem)?;
    Ok((rem, (factor, name)))
}

/// Parses one side of a reaction, a `+`-separated list of partner terms.
/// The input has already had all whitespace stripped.
fn parse_partner_list(data: &str) -> IResult<&str, Vec<(u32, &str)>> {
    separated_list0(tag("+"), parse_partner).parse(data)
}

impl ConfigParser {
    pub fn new(rate_divisor: f64) -> ConfigParser {
        ConfigParser {
            rate_divisor,
            substances: SubstanceTable::default(),
            reactions: Vec::new(),
            section: Section::default(),
            lineno: 0,
        }
    }

    /// Parses a configuration file, accumulating onto any previously parsed
    /// content.
    pub fn parse_file(&mut self, path: &Path) -> Result<&mut Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::FileUnreadable {
            path: path.to_owned(),
            source,
        })?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| ConfigError::FileUnreadable {
                path: path.to_owned(),
                source,
            })?;
            self.handle_line(&line)?;
        }
        Ok(self)
    }

    /// Parses configuration text held in memory.
    pub fn parse_str(&mut self, text: &str) -> Result<&mut Self, ConfigError> {
        for line in text.lines() {
            self.handle_line(line)?;
        }
        Ok(self)
    }

    /// Finishes parsing and hands the network over. Warns about reactions
    /// whose product side names a non-discrete substance: such
    /// concentrations stay static, and the reaction still loads.
    pub fn into_network(self) -> (SubstanceTable, Vec<Reaction>) {
        for (idx, reaction) in self.reactions.iter().enumerate() {
            if reaction
                .products
                .iter()
                .any(|&(s, _)| !self.substances.get(s).is_discrete())
            {
                warn!(
                    "reaction {} ({}) produces a non-discrete substance whose concentration is static",
                    idx,
                    reaction.format_pretty(&self.substances)
                );
            }
        }
        (self.substances, self.reactions)
    }

    fn handle_line(&mut self, raw: &str) -> Result<(), ConfigError> {
        self.lineno += 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        match line {
            "[substances]" => {
                self.section = Section::Substances;
                return Ok(());
            }
            "[reactions]" => {
                self.section = Section::Reactions;
                return Ok(());
            }
            _ => {}
        }
        match self.section {
            Section::Prolog => Ok(()),
            Section::Substances => self.handle_substance_line(line),
            Section::Reactions => self.handle_reaction_line(line),
        }
    }

    fn handle_substance_line(&mut self, line: &str) -> Result<(), ConfigError> {
        let (_, (name, kind, num1, num2)) = parse_substance_line(line)
            .map_err(|_| ConfigError::BadSubstanceLine(self.lineno))?;

        let kind = match kind {
            "isotropic" => {
                let concentration = num1.unwrap_or_else(|| {
                    warn!(
                        "isotropic substance {name:?} has no concentration; assuming 0"
                    );
                    0.
                });
                SubstanceKind::Isotropic { concentration }
            }
            "discrete" => {
                let (Some(mass), Some(charge)) = (num1, num2) else {
                    return Err(ConfigError::DiscreteMissingPhysics(name.to_owned()));
                };
                SubstanceKind::Discrete { mass, charge }
            }
            "field" => SubstanceKind::Field,
            other => return Err(ConfigError::UnknownKind(other.to_owned())),
        };

        self.substances.add(Substance::new(name.to_owned(), kind));
        Ok(())
    }

    fn handle_reaction_line(&mut self, line: &str) -> Result<(), ConfigError> {
        let stripped: String = line.split_whitespace().collect();
        let fields: Vec<&str> = stripped.split(';').collect();
        if fields.len() != 2 && fields.len() != 3 {
            return Err(ConfigError::BadReactionLine(self.lineno));
        }

        let (educt_expr, product_expr) = fields[0]
            .split_once("=>")
            .ok_or(ConfigError::BadReactionLine(self.lineno))?;
        let educts = self.resolve_side(educt_expr)?;
        let products = self.resolve_side(product_expr)?;

        let rate: f64 = fields[1]
            .parse()
            .map_err(|_| ConfigError::BadReactionLine(self.lineno))?;
        let activation_energy = match fields.get(2) {
            Some(field) => Some(
                field
                    .parse()
                    .map_err(|_| ConfigError::BadReactionLine(self.lineno))?,
            ),
            None => None,
        };

        self.reactions.push(Reaction::new(
            educts,
            products,
            rate / self.rate_divisor,
            activation_energy,
            &self.substances,
        ));
        Ok(())
    }

    /// Resolves one side of a reaction into ascending coefficient pairs,
    /// accumulating repeated substances.
    fn resolve_side(&self, expr: &str) -> Result<PartnerVec, ConfigError> {
        let (rem, partners) =
            parse_partner_list(expr).map_err(|_| ConfigError::BadReactionLine(self.lineno))?;
        if !rem.is_empty() {
            return Err(ConfigError::BadReactionLine(self.lineno));
        }

        let mut side = PartnerVec::new();
        for (factor, name) in partners {
            let idx = self
                .substances
                .index_by_name(name)
                .ok_or_else(|| ConfigError::UnknownSpecies(name.to_owned()))?;
            match side.iter_mut().find(|entry| entry.0 == idx) {
                Some(entry) => entry.1 += factor,
                None => side.push((idx, factor)),
            }
        }
        side.sort_unstable_by_key(|&(idx, _)| idx);
        Ok(side)
    }
}
