//! Parser for the ngspice rawfile format.
//!
//! A rawfile is a text header followed by either an ASCII `Values:` block or
//! a little-endian `Binary:` block. Header fields:
//! - Title, Plotname, Flags (`real` or `complex`)
//! - No. Variables, No. Points
//! - Variables: one `index name type` line per column

use crate::error::EngineError;
use crate::ngspice::types::{RawVariable, RawfileData, RawfileHeader};

type Result<T> = std::result::Result<T, EngineError>;

fn parse_error(msg: impl Into<String>) -> EngineError {
    EngineError::RawfileParse(msg.into())
}

/// Parse the first plot of a rawfile.
pub fn parse_rawfile(data: &[u8]) -> Result<RawfileData> {
    let text = String::from_utf8_lossy(data);
    let header = parse_header(&text)?;

    if header.num_variables == 0 || header.variables.len() != header.num_variables {
        return Err(parse_error(format!(
            "header declares {} variables but lists {}",
            header.num_variables,
            header.variables.len()
        )));
    }

    if header.is_binary {
        parse_binary_data(data, header)
    } else {
        parse_ascii_data(&text, header)
    }
}

fn header_field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key).map(str::trim)
}

fn parse_header(data: &str) -> Result<RawfileHeader> {
    let mut header = RawfileHeader {
        title: String::new(),
        plotname: String::new(),
        flags: String::new(),
        num_variables: 0,
        num_points: 0,
        variables: Vec::new(),
        is_complex: false,
        is_binary: false,
    };
    let mut in_variables = false;
    let mut found_data = false;

    for line in data.lines() {
        let line = line.trim();

        if let Some(v) = header_field(line, "Title:") {
            header.title = v.to_string();
        } else if let Some(v) = header_field(line, "Plotname:") {
            header.plotname = v.to_string();
        } else if let Some(v) = header_field(line, "Flags:") {
            header.flags = v.to_string();
        } else if let Some(v) = header_field(line, "No. Variables:") {
            header.num_variables = v
                .parse()
                .map_err(|_| parse_error(format!("invalid No. Variables: {}", v)))?;
        } else if let Some(v) = header_field(line, "No. Points:") {
            header.num_points = v
                .parse()
                .map_err(|_| parse_error(format!("invalid No. Points: {}", v)))?;
        } else if line.starts_with("Variables:") {
            in_variables = true;
        } else if line.starts_with("Values:") || line.starts_with("Binary:") {
            header.is_binary = line.starts_with("Binary:");
            found_data = true;
            break;
        } else if in_variables && !line.is_empty() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                let index: usize = parts[0]
                    .parse()
                    .map_err(|_| parse_error(format!("invalid variable index: {}", parts[0])))?;
                header.variables.push(RawVariable {
                    index,
                    name: parts[1].to_string(),
                    var_type: parts[2].to_string(),
                });
            }
        }
    }

    if !found_data {
        return Err(parse_error("no Values: or Binary: section found"));
    }

    header.is_complex = header.flags.to_lowercase().contains("complex");
    Ok(header)
}

fn parse_ascii_data(data: &str, header: RawfileHeader) -> Result<RawfileData> {
    let values_start = data
        .find("Values:")
        .ok_or_else(|| parse_error("Values: marker not found"))?;
    let section = &data[values_start + "Values:".len()..];

    let n = header.num_variables;
    let mut real_data: Vec<Vec<f64>> = Vec::with_capacity(header.num_points);
    let mut imag_data: Vec<Vec<f64>> = Vec::new();
    let mut point_real: Vec<f64> = Vec::with_capacity(n);
    let mut point_imag: Vec<f64> = Vec::with_capacity(n);
    let mut expecting_index = true;

    for line in section.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // A point starts with its index, optionally followed by the first value.
        let value_text = if expecting_index {
            expecting_index = false;
            match line.split_once(char::is_whitespace) {
                Some((_, rest)) => rest.trim(),
                None => continue,
            }
        } else {
            line
        };

        if header.is_complex {
            let (re, im) = parse_complex_value(value_text)
                .ok_or_else(|| parse_error(format!("invalid complex value: {}", value_text)))?;
            point_real.push(re);
            point_imag.push(im);
        } else {
            let v = value_text
                .parse::<f64>()
                .map_err(|_| parse_error(format!("invalid value: {}", value_text)))?;
            point_real.push(v);
        }

        if point_real.len() == n {
            real_data.push(std::mem::replace(&mut point_real, Vec::with_capacity(n)));
            if header.is_complex {
                imag_data.push(std::mem::replace(&mut point_imag, Vec::with_capacity(n)));
            }
            expecting_index = true;
            if real_data.len() == header.num_points {
                break;
            }
        }
    }

    Ok(RawfileData {
        imag_data: header.is_complex.then_some(imag_data),
        header,
        real_data,
    })
}

/// Parse `real,imag` (or a bare real value).
fn parse_complex_value(s: &str) -> Option<(f64, f64)> {
    match s.split_once(',') {
        Some((re, im)) => Some((re.trim().parse().ok()?, im.trim().parse().ok()?)),
        None => Some((s.trim().parse().ok()?, 0.0)),
    }
}

fn parse_binary_data(data: &[u8], header: RawfileHeader) -> Result<RawfileData> {
    let marker = b"Binary:\n";
    let marker_pos =
        find_bytes(data, marker).ok_or_else(|| parse_error("Binary: marker not found"))?;
    let body = &data[marker_pos + marker.len()..];

    let bytes_per_value = if header.is_complex { 16 } else { 8 };
    let bytes_per_point = header.num_variables * bytes_per_value;
    let available = body.len() / bytes_per_point;
    if available < header.num_points {
        return Err(parse_error(format!(
            "binary section holds {} of {} points",
            available, header.num_points
        )));
    }

    let mut real_data = Vec::with_capacity(header.num_points);
    let mut imag_data = Vec::new();

    for point in body.chunks_exact(bytes_per_point).take(header.num_points) {
        let mut point_real = Vec::with_capacity(header.num_variables);
        let mut point_imag = Vec::with_capacity(header.num_variables);

        for value in point.chunks_exact(bytes_per_value) {
            point_real.push(read_f64_le(&value[..8]));
            if header.is_complex {
                point_imag.push(read_f64_le(&value[8..16]));
            }
        }

        real_data.push(point_real);
        if header.is_complex {
            imag_data.push(point_imag);
        }
    }

    Ok(RawfileData {
        imag_data: header.is_complex.then_some(imag_data),
        header,
        real_data,
    })
}

fn read_f64_le(data: &[u8]) -> f64 {
    let bytes: [u8; 8] = data.try_into().unwrap_or([0; 8]);
    f64::from_le_bytes(bytes)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
