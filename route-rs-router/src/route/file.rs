use super::table::{RouteEntry, RouteTable};
use crate::error::{Result, RouterError};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::info;

/// Parses a static route file. Each line is
/// `<destination> <gateway> <mask> <interface>`, whitespace separated. Blank lines and lines
/// starting with `#` are skipped. Any malformed line fails the whole file.
pub fn parse_routes(path: &Path, contents: &str) -> Result<Vec<RouteEntry>> {
    let mut routes = vec![];
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let malformed = |reason: String| RouterError::MalformedRoute {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(malformed(format!(
                "expected 4 fields, found {}",
                fields.len()
            )));
        }
        let parse = |field: &str, what: &str| {
            field
                .parse::<Ipv4Addr>()
                .map_err(|_| malformed(format!("bad {} address {:?}", what, field)))
        };
        let destination = parse(fields[0], "destination")?;
        let gateway = parse(fields[1], "gateway")?;
        let mask = parse(fields[2], "mask")?;
        routes.push(RouteEntry::fixed(destination, mask, gateway, fields[3]));
    }
    Ok(routes)
}

impl RouteTable {
    /// Replaces the table with the routes in `path`. Nothing changes if the file cannot be
    /// read or any line fails to parse.
    pub fn load_static(&self, path: &Path) -> Result<usize> {
        let contents = fs::read_to_string(path).map_err(|source| RouterError::RouteFile {
            path: path.to_path_buf(),
            source,
        })?;
        let routes = parse_routes(path, &contents)?;
        let count = routes.len();
        if count > 0 {
            self.replace(routes);
        }
        info!("Loaded {} static routes from {}", count, path.display());
        Ok(count)
    }
}
