//! CSV table writer for crawl records.
//!
//! The first line is the [`TileRecord::header`]; every following line is
//! one tile. Values are written with Rust's shortest round-trip float
//! formatting (`0`, `0.5`, `59.415335`), comma separated, `\n` terminated.
//!
//! That formatting never uses an exponent. Float drift that leaves a
//! latitude near zero is written out in full, e.g.
//! `-0.000000000000000027755575615628914` rather than
//! `-2.7755575615628914e-17`, and very large statistics get every integer
//! digit. Both forms parse back to the same `f64`.

use std::io;

use price_map_source_models::TileRecord;

use crate::CrawlError;

/// Streams [`TileRecord`]s into a CSV table, one row per call.
pub struct CsvSink<W: io::Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: io::Write> CsvSink<W> {
    /// Wraps `inner` and writes the header line.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Csv`] if the header cannot be written.
    pub fn new(inner: W) -> Result<Self, CrawlError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);

        writer.write_record(TileRecord::header())?;
        writer.flush()?;

        Ok(Self { writer, rows: 0 })
    }

    /// Appends one row and flushes it, so a crawl that dies midway leaves
    /// every finished tile on disk.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError`] if the row cannot be written or flushed.
    pub fn write(&mut self, record: &TileRecord) -> Result<(), CrawlError> {
        self.writer
            .write_record(record.values().iter().map(f64::to_string))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written so far (header excluded).
    #[must_use]
    pub const fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Io`] if the final flush fails.
    pub fn into_inner(self) -> Result<W, CrawlError> {
        self.writer
            .into_inner()
            .map_err(|e| CrawlError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use price_map_grid_models::{Coordinate, Tile};
    use price_map_source_models::{FetchFailure, FetchOutcome, TileStats};

    use super::*;

    fn unit_tile() -> Tile {
        Tile::from_corner(Coordinate::new(1.0, 0.0), 0.5, 0.5)
    }

    fn written(records: &[TileRecord]) -> String {
        let mut sink = CsvSink::new(Vec::new()).unwrap();
        for record in records {
            sink.write(record).unwrap();
        }
        assert_eq!(sink.rows(), records.len() as u64);
        String::from_utf8(sink.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn header_only_for_empty_crawl() {
        assert_eq!(
            written(&[]),
            "TopLeftLat,TopLeftLon,BottomRightLat,BottomRightLon,WeightPrice,WeightSqr,\
             Price,PriceSqr,Hits,PointsForSqrPriceInterval,PointsForPriceInterval,\
             PointsForZoom,PointsForDays,PointsForHits,PointsForDistance,\
             SumPointsPrice,SumPointsSqr\n"
        );
    }

    #[test]
    fn renders_numbers_in_shortest_form() {
        let stats = TileStats {
            weight_price: 3_120_000.0,
            price_sqr: 48_000.25,
            hits: 17.0,
            ..TileStats::empty()
        };
        let output = written(&[TileRecord::new(unit_tile(), FetchOutcome::Found(stats))]);
        let row = output.lines().nth(1).unwrap();

        assert_eq!(row, "1,0,0.5,0.5,3120000,0,0,48000.25,17,0,0,0,0,0,0,0,0");
    }

    #[test]
    fn tiny_values_are_written_without_exponent() {
        let tile = Tile {
            top_left: Coordinate::new(-2.775_557_561_562_891_4e-17, 0.0),
            bottom_right: Coordinate::new(-0.5, 0.5),
        };
        let output = written(&[TileRecord::new(tile, FetchOutcome::Found(TileStats::empty()))]);
        let row = output.lines().nth(1).unwrap();

        let lat = format!("-0.{}27755575615628914", "0".repeat(16));
        assert_eq!(row, format!("{lat},0,-0.5,0.5{}", ",0".repeat(13)));
        assert_eq!(lat.parse::<f64>().unwrap().to_bits(), tile.top_left.lat.to_bits());
    }

    #[test]
    fn failed_record_renders_zero_statistics() {
        let record = TileRecord::new(
            unit_tile(),
            FetchOutcome::Failed(FetchFailure::Status { status: 500 }),
        );
        let output = written(&[record]);
        let row = output.lines().nth(1).unwrap();

        assert_eq!(row, format!("1,0,0.5,0.5{}", ",0".repeat(13)));
    }

    #[test]
    fn every_line_has_header_width() {
        let records = vec![
            TileRecord::new(unit_tile(), FetchOutcome::Found(TileStats::empty())),
            TileRecord::new(
                unit_tile(),
                FetchOutcome::Failed(FetchFailure::Transport {
                    message: "refused".to_owned(),
                }),
            ),
        ];
        let output = written(&records);

        assert!(output.ends_with('\n'));
        for line in output.lines() {
            assert_eq!(line.split(',').count(), 17, "{line}");
        }
    }
}
