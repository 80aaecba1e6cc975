//! In-memory form of an ngspice rawfile.

use num_complex::Complex;

/// Analysis type parsed from the rawfile plot name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    OperatingPoint,
    DcSweep,
    Ac,
    Transient,
    Unknown,
}

/// One column of the rawfile.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    pub index: usize,
    /// e.g. `v(out)`, `i(v1)`, `frequency`
    pub name: String,
    /// e.g. `voltage`, `current`, `time`, `frequency`
    pub var_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawfileHeader {
    pub title: String,
    pub plotname: String,
    pub flags: String,
    pub num_variables: usize,
    pub num_points: usize,
    pub variables: Vec<RawVariable>,
    pub is_complex: bool,
    pub is_binary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawfileData {
    pub header: RawfileHeader,
    /// `num_points` rows of `num_variables` values. Real parts only for
    /// complex data.
    pub real_data: Vec<Vec<f64>>,
    pub imag_data: Option<Vec<Vec<f64>>>,
}

impl RawfileData {
    /// Assemble rawfile data from named columns.
    ///
    /// `variables` is a list of `(name, type)` pairs; each row of
    /// `real_data` (and `imag_data`, when present) follows that order.
    pub fn from_columns(
        plotname: &str,
        variables: &[(&str, &str)],
        real_data: Vec<Vec<f64>>,
        imag_data: Option<Vec<Vec<f64>>>,
    ) -> Self {
        let variables: Vec<RawVariable> = variables
            .iter()
            .enumerate()
            .map(|(index, (name, var_type))| RawVariable {
                index,
                name: name.to_string(),
                var_type: var_type.to_string(),
            })
            .collect();
        let is_complex = imag_data.is_some();

        Self {
            header: RawfileHeader {
                title: String::new(),
                plotname: plotname.to_string(),
                flags: if is_complex { "complex" } else { "real" }.to_string(),
                num_variables: variables.len(),
                num_points: real_data.len(),
                variables,
                is_complex,
                is_binary: false,
            },
            real_data,
            imag_data,
        }
    }

    pub fn plot_kind(&self) -> PlotKind {
        let plotname = self.header.plotname.to_lowercase();
        if plotname.contains("operating point") {
            PlotKind::OperatingPoint
        } else if plotname.contains("dc transfer") {
            PlotKind::DcSweep
        } else if plotname.contains("ac analysis") {
            PlotKind::Ac
        } else if plotname.contains("transient") {
            PlotKind::Transient
        } else {
            PlotKind::Unknown
        }
    }

    /// Find a variable by name, ignoring case.
    pub fn find_variable(&self, name: &str) -> Option<&RawVariable> {
        self.header
            .variables
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }

    /// First variable of the given type, e.g. `time` or `frequency`.
    pub fn find_by_type(&self, var_type: &str) -> Option<&RawVariable> {
        self.header
            .variables
            .iter()
            .find(|v| v.var_type.eq_ignore_ascii_case(var_type))
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.header.variables.iter().map(|v| v.name.clone()).collect()
    }

    pub fn real_values(&self, index: usize) -> Option<Vec<f64>> {
        self.real_data
            .iter()
            .map(|row| row.get(index).copied())
            .collect()
    }

    pub fn complex_values(&self, index: usize) -> Option<Vec<Complex<f64>>> {
        let imag = self.imag_data.as_ref()?;
        self.real_data
            .iter()
            .zip(imag.iter())
            .map(|(re_row, im_row)| Some(Complex::new(*re_row.get(index)?, *im_row.get(index)?)))
            .collect()
    }

    /// Value of a variable at the first point, as for an operating point.
    pub fn first_value(&self, index: usize) -> Option<f64> {
        self.real_data.first()?.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_and_lookup() {
        let raw = RawfileData::from_columns(
            "Operating Point",
            &[("v(in)", "voltage"), ("v(out)", "voltage"), ("i(v1)", "current")],
            vec![vec![5.0, 2.5, -0.0025]],
            None,
        );

        assert_eq!(raw.plot_kind(), PlotKind::OperatingPoint);
        let out = raw.find_variable("V(OUT)").unwrap();
        assert_eq!(out.index, 1);
        assert_eq!(raw.first_value(out.index), Some(2.5));
        assert_eq!(raw.real_values(2), Some(vec![-0.0025]));
        assert_eq!(raw.real_values(7), None);
        assert!(raw.complex_values(0).is_none());
    }

    #[test]
    fn test_complex_columns() {
        let raw = RawfileData::from_columns(
            "AC Analysis",
            &[("frequency", "frequency"), ("v(out)", "voltage")],
            vec![vec![1.0, 0.5], vec![10.0, 0.25]],
            Some(vec![vec![0.0, 0.5], vec![0.0, -0.25]]),
        );

        assert_eq!(raw.plot_kind(), PlotKind::Ac);
        assert_eq!(raw.find_by_type("frequency").map(|v| v.index), Some(0));
        let values = raw.complex_values(1).unwrap();
        assert_eq!(values[0], Complex::new(0.5, 0.5));
        assert_eq!(values[1], Complex::new(0.25, -0.25));
    }
}
