use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, preceded, tuple},
    IResult,
};
use uuid::Uuid;

use crate::model::{Filter, Memory, MemoryUnit};

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Create { count: usize },
    Get { id: Uuid },
    Search { filter: Filter },
    Export { id: Uuid, path: String },
    Import { path: String },
    Help,
    Exit,
}

#[derive(Debug, Clone, Copy)]
enum Clause {
    Price(f64),
    Cores(u32),
    Ghz(f64),
    Ram(Memory),
}

// --- BASIC PARSERS ---

fn parse_f64(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((opt(char('-')), digit1, opt(tuple((char('.'), digit1)))))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

fn parse_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

fn parse_u64(input: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(input)
}

fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = take_until("\"")(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content.to_string()))
}

fn parse_uuid(input: &str) -> IResult<&str, Uuid> {
    let (rest, uuid_str) = take_while1(|c: char| c.is_ascii_hexdigit() || c == '-')(input)?;
    match Uuid::parse_str(uuid_str) {
        Ok(uuid) => Ok((rest, uuid)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

fn parse_quoted_uuid(input: &str) -> IResult<&str, Uuid> {
    delimited(opt(char('\'')), parse_uuid, opt(char('\'')))(input)
}

fn parse_unit(input: &str) -> IResult<&str, MemoryUnit> {
    // Longer spellings first: BIT and BYTE before B, GIGABYTE before GB
    alt((
        value(MemoryUnit::Terabyte, tag_ci("TERABYTE")),
        value(MemoryUnit::Gigabyte, tag_ci("GIGABYTE")),
        value(MemoryUnit::Megabyte, tag_ci("MEGABYTE")),
        value(MemoryUnit::Kilobyte, tag_ci("KILOBYTE")),
        value(MemoryUnit::Byte, tag_ci("BYTE")),
        value(MemoryUnit::Bit, tag_ci("BIT")),
        value(MemoryUnit::Kilobyte, tag_ci("KB")),
        value(MemoryUnit::Megabyte, tag_ci("MB")),
        value(MemoryUnit::Gigabyte, tag_ci("GB")),
        value(MemoryUnit::Terabyte, tag_ci("TB")),
        value(MemoryUnit::Byte, tag_ci("B")),
    ))(input)
}

// --- HELPERS ---
fn ws<'a, F, O, E: nom::error::ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where F: FnMut(&'a str) -> IResult<&'a str, O, E> {
    delimited(multispace0, inner, multispace0)
}

fn tag_ci(t: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| tag_no_case(t)(input)
}

// --- SEARCH CLAUSES ---

fn clause_price(input: &str) -> IResult<&str, Clause> {
    map(preceded(tuple((ws(tag_ci("PRICE")), ws(tag("<=")))), parse_f64), Clause::Price)(input)
}

fn clause_cores(input: &str) -> IResult<&str, Clause> {
    map(preceded(tuple((ws(tag_ci("CORES")), ws(tag(">=")))), parse_u32), Clause::Cores)(input)
}

fn clause_ghz(input: &str) -> IResult<&str, Clause> {
    map(preceded(tuple((ws(tag_ci("GHZ")), ws(tag(">=")))), parse_f64), Clause::Ghz)(input)
}

fn clause_ram(input: &str) -> IResult<&str, Clause> {
    let (input, _) = tuple((ws(tag_ci("RAM")), ws(tag(">="))))(input)?;
    let (input, value) = parse_u64(input)?;
    let (input, unit) = ws(parse_unit)(input)?;
    Ok((input, Clause::Ram(Memory::new(value, unit))))
}

// --- COMMAND PARSERS ---

fn parse_create(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("CREATE")(input)?;
    let (input, count) = opt(preceded(multispace1, map_res(digit1, |s: &str| s.parse::<usize>())))(input)?;
    Ok((input, Command::Create { count: count.unwrap_or(1) }))
}

fn parse_get(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("GET")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, id) = parse_quoted_uuid(input)?;
    Ok((input, Command::Get { id }))
}

/// `SEARCH` with any subset of clauses, in any order. Missing bounds do not
/// restrict the result.
fn parse_search(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("SEARCH")(input)?;
    let (input, clauses) = many0(alt((clause_price, clause_cores, clause_ghz, clause_ram)))(input)?;

    let mut filter = Filter { max_price_usd: f64::MAX, ..Filter::default() };
    for clause in clauses {
        match clause {
            Clause::Price(p) => filter.max_price_usd = p,
            Clause::Cores(c) => filter.min_cpu_cores = c,
            Clause::Ghz(g) => filter.min_cpu_ghz = g,
            Clause::Ram(m) => filter.min_ram = m,
        }
    }
    Ok((input, Command::Search { filter }))
}

fn parse_export(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("EXPORT")(input)?;
    let (input, id) = ws(parse_quoted_uuid)(input)?;
    let (input, _) = opt(ws(tag_ci("TO")))(input)?;
    let (input, path) = parse_quoted_string(input)?;
    Ok((input, Command::Export { id, path }))
}

fn parse_import(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("IMPORT")(input)?;
    let (input, _) = opt(ws(tag_ci("FROM")))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, path) = parse_quoted_string(input)?;
    Ok((input, Command::Import { path }))
}

fn parse_help(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("HELP")(input)?;
    Ok((input, Command::Help))
}

fn parse_exit(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("EXIT"), tag_ci("QUIT")))(input)?;
    Ok((input, Command::Exit))
}

pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let result = alt((
        parse_create,
        parse_get,
        parse_search,
        parse_export,
        parse_import,
        parse_help,
        parse_exit,
    ))(input);

    match result {
        Ok((remainder, cmd)) => {
            if !remainder.trim().is_empty() {
                return Err(format!("Unexpected tokens at end: '{}'", remainder));
            }
            Ok(cmd)
        },
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            // e.input contains the slice where parsing failed
            let context: String = if e.input.chars().count() > 20 {
                format!("{}...", e.input.chars().take(20).collect::<String>())
            } else {
                e.input.to_string()
            };
            Err(format!("Invalid syntax near: '{}'", context))
        },
        Err(nom::Err::Incomplete(_)) => Err("Incomplete command.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const ID: &str = "6f1c7a3e-2b8d-4c5e-9a0f-1d2e3f4a5b6c";

    fn id() -> Uuid {
        Uuid::parse_str(ID).unwrap()
    }

    #[rstest]
    #[case("CREATE", Command::Create { count: 1 })]
    #[case("create 10", Command::Create { count: 10 })]
    #[case("HELP", Command::Help)]
    #[case("quit", Command::Exit)]
    #[case("GET 6f1c7a3e-2b8d-4c5e-9a0f-1d2e3f4a5b6c", Command::Get { id: id() })]
    #[case("get '6f1c7a3e-2b8d-4c5e-9a0f-1d2e3f4a5b6c'", Command::Get { id: id() })]
    #[case(
        "EXPORT '6f1c7a3e-2b8d-4c5e-9a0f-1d2e3f4a5b6c' TO \"tmp/laptop.json\"",
        Command::Export { id: id(), path: "tmp/laptop.json".into() }
    )]
    #[case("IMPORT FROM \"laptop.bin\"", Command::Import { path: "laptop.bin".into() })]
    fn parses_simple_commands(#[case] input: &str, #[case] expected: Command) {
        assert_eq!(parse_command(input).unwrap(), expected);
    }

    #[test]
    fn search_with_every_clause() {
        let cmd = parse_command("SEARCH PRICE <= 3000 CORES >= 4 GHZ >= 2.5 RAM >= 8 GB").unwrap();
        assert_eq!(cmd, Command::Search {
            filter: Filter {
                max_price_usd: 3000.0,
                min_cpu_cores: 4,
                min_cpu_ghz: 2.5,
                min_ram: Memory::new(8, MemoryUnit::Gigabyte),
            },
        });
    }

    #[test]
    fn search_clauses_in_any_order() {
        let Command::Search { filter } = parse_command("search ram >= 512 mb price <= 999.5").unwrap() else {
            panic!("expected a search");
        };
        assert_eq!(filter.max_price_usd, 999.5);
        assert_eq!(filter.min_ram, Memory::new(512, MemoryUnit::Megabyte));
        assert_eq!(filter.min_cpu_cores, 0);
    }

    #[test]
    fn bare_search_is_unbounded() {
        let Command::Search { filter } = parse_command("SEARCH").unwrap() else {
            panic!("expected a search");
        };
        assert_eq!(filter.max_price_usd, f64::MAX);
        assert_eq!(filter.min_ram.to_bits(), 0);
    }

    #[rstest]
    #[case("1 BIT", MemoryUnit::Bit)]
    #[case("1 B", MemoryUnit::Byte)]
    #[case("1 kb", MemoryUnit::Kilobyte)]
    #[case("1 TB", MemoryUnit::Terabyte)]
    #[case("8 BYTE", MemoryUnit::Byte)]
    #[case("8 gigabyte", MemoryUnit::Gigabyte)]
    #[case("2 Megabyte", MemoryUnit::Megabyte)]
    #[case("4 KILOBYTE", MemoryUnit::Kilobyte)]
    #[case("1 TERABYTE", MemoryUnit::Terabyte)]
    fn ram_units(#[case] ram: &str, #[case] unit: MemoryUnit) {
        let Command::Search { filter } = parse_command(&format!("SEARCH RAM >= {ram}")).unwrap() else {
            panic!("expected a search");
        };
        assert_eq!(filter.min_ram.unit, unit);
    }

    #[rstest]
    #[case::unknown_verb("DROP TABLE laptops")]
    #[case::bad_uuid("GET 'not-a-uuid'")]
    #[case::trailing_tokens("HELP me")]
    #[case::wrong_operator("SEARCH PRICE >= 10")]
    fn rejects_bad_input(#[case] input: &str) {
        assert!(parse_command(input).is_err(), "{input}");
    }
}
