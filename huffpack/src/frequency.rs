use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyEntry {
    pub symbol: u8,
    pub count: u64,
}

/// Occurrence counts for every byte value seen in an input.
#[derive(Clone)]
pub struct FrequencyTable {
    counts: [u64; 256],
    total: u64,
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            counts: [0; 256],
            total: 0,
        }
    }
}

impl std::fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.entries().map(|entry| (entry.symbol, entry.count)))
            .finish()
    }
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut table = Self::default();
        table.update(data);
        table
    }

    pub fn from_reader(reader: &mut impl Read) -> std::io::Result<Self> {
        let mut table = Self::default();
        let mut buffer = [0; 4096];

        loop {
            let num_read_bytes = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            table.update(&buffer[..num_read_bytes]);
        }

        Ok(table)
    }

    pub fn update(&mut self, data: &[u8]) {
        for byte in data {
            self.counts[*byte as usize] += 1;
        }
        self.total += data.len() as u64;
    }

    pub fn count(&self, symbol: u8) -> u64 {
        self.counts[symbol as usize]
    }

    /// Total number of bytes counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct_symbols(&self) -> usize {
        self.counts.iter().filter(|&&count| count != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Symbols with a non-zero count, ascending by symbol value.
    pub fn entries(&self) -> impl Iterator<Item = FrequencyEntry> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count != 0)
            .map(|(symbol, &count)| FrequencyEntry {
                symbol: symbol as u8,
                count,
            })
    }
}
