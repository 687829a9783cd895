/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// kg to short tons.
pub const TONS_PER_KG: f64 = 0.001_102_31;

/// Detachment (kg/m²) to t/ha as reported by WEPP event output.
pub const DETACHMENT_TO_TONS_PER_HA: f64 = 11.0231;

/// lbs/ac to t/ha.
pub const LBS_PER_ACRE_TO_TONS_PER_HA: f64 = 0.001_235_53;

/// Days in each month of a non-leap year, as CLIGEN assumes.
pub const DAYS_IN_MONTH: [f64; 12] = [
    31.0, 28.0, 31.0, 30.0, 31.0, 30.0, 31.0, 31.0, 30.0, 31.0, 30.0, 31.0,
];

/// Number of monthly values on a CLIGEN parameter row.
pub const MONTHS: usize = 12;

/// GDS header prefix expected by GenStPar.
pub const GDS_HEADER_PREFIX: &str = "99048";

/// Spaces between the station key and coordinates in a GDS header.
pub const GDS_HEADER_PADDING: usize = 35;

/// Number of lines in a TOP file (the leading block of a PAR file).
pub const TOP_LINES: usize = 12;

/// Number of header lines preceding the monthly rows of a TOP file.
pub const TOP_HEADER_LINES: usize = 3;

/// Header lines preceding the column names of a CLI file.
pub const CLI_HEADER_LINES: usize = 13;

/// Header lines preceding the records of a WEPP event output file.
pub const EBE_HEADER_LINES: usize = 3;

/// Marker on the `.loss` line carrying the hillslope profile width.
pub const LOSS_WIDTH_KEY: &str = "kg (based on profile width of";

/// Marker on the `.loss` line carrying the hillslope area.
pub const LOSS_AREA_KEY: &str = "t/ha (assuming contributions from";

/// Saturation value marking the OFE parameter line in a `.sol` file.
pub const SOL_OFE_MARKER: &str = "0.750000";
