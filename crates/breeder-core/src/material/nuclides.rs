//! Natural isotopic abundances (atom fractions, IUPAC representative values).

/// Isotopes of `element` with their natural atom fractions, or `None` if the
/// element is not tabulated.
pub fn natural_isotopes(element: &str) -> Option<&'static [(&'static str, f64)]> {
    let table: &'static [(&'static str, f64)] = match element {
        "H" => &[("H1", 0.999885), ("H2", 0.000115)],
        "Li" => &[("Li6", 0.0759), ("Li7", 0.9241)],
        "Be" => &[("Be9", 1.0)],
        "C" => &[("C12", 0.9893), ("C13", 0.0107)],
        "O" => &[("O16", 0.99757), ("O17", 0.00038), ("O18", 0.00205)],
        "F" => &[("F19", 1.0)],
        "Si" => &[("Si28", 0.92223), ("Si29", 0.04685), ("Si30", 0.03092)],
        "Ti" => &[
            ("Ti46", 0.0825),
            ("Ti47", 0.0744),
            ("Ti48", 0.7372),
            ("Ti49", 0.0541),
            ("Ti50", 0.0518),
        ],
        "V" => &[("V50", 0.0025), ("V51", 0.9975)],
        "Cr" => &[
            ("Cr50", 0.04345),
            ("Cr52", 0.83789),
            ("Cr53", 0.09501),
            ("Cr54", 0.02365),
        ],
        "Mn" => &[("Mn55", 1.0)],
        "Fe" => &[
            ("Fe54", 0.05845),
            ("Fe56", 0.91754),
            ("Fe57", 0.02119),
            ("Fe58", 0.00282),
        ],
        "Ni" => &[
            ("Ni58", 0.680769),
            ("Ni60", 0.262231),
            ("Ni61", 0.011399),
            ("Ni62", 0.036345),
            ("Ni64", 0.009256),
        ],
        "Cu" => &[("Cu63", 0.6915), ("Cu65", 0.3085)],
        "Mo" => &[
            ("Mo92", 0.1453),
            ("Mo94", 0.0915),
            ("Mo95", 0.1584),
            ("Mo96", 0.1667),
            ("Mo97", 0.0960),
            ("Mo98", 0.2439),
            ("Mo100", 0.0982),
        ],
        "Ta" => &[("Ta180", 0.0001201), ("Ta181", 0.9998799)],
        "W" => &[
            ("W180", 0.0012),
            ("W182", 0.2650),
            ("W183", 0.1431),
            ("W184", 0.3064),
            ("W186", 0.2843),
        ],
        "Pb" => &[
            ("Pb204", 0.014),
            ("Pb206", 0.241),
            ("Pb207", 0.221),
            ("Pb208", 0.524),
        ],
        _ => return None,
    };
    Some(table)
}

/// Element symbol of a nuclide name (`"Li6"` -> `"Li"`).
pub fn element_of(nuclide: &str) -> &str {
    let end = nuclide
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(nuclide.len());
    &nuclide[..end]
}

/// Mass number of a nuclide name (`"Li6"` -> `6`).
///
/// Used as the nuclide mass when converting weight fractions; the mass
/// defect is far below the precision of catalog compositions.
pub fn mass_number(nuclide: &str) -> Option<u32> {
    let digits = &nuclide[element_of(nuclide).len()..];
    digits.parse().ok()
}
