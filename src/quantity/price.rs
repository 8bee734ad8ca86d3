//! Day-ahead price in the currency and unit of the price source, typically per megawatt-hour.

quantity!(Price, suffix: "/MWh", precision: 2);
