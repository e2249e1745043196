use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// (category, merchants, typical amount, spread)
const CATEGORIES: &[(&str, &[&str], f64, f64)] = &[
    ("Groceries", &["Whole Foods", "Trader Joe's", "Safeway"], 65.0, 25.0),
    ("Dining", &["Starbucks", "Chipotle", "Local Bistro"], 22.0, 10.0),
    ("Transport", &["Uber", "Shell", "Metro Transit"], 30.0, 12.0),
    ("Utilities", &["City Power", "Water Co", "Comcast"], 110.0, 20.0),
    ("Shopping", &["Amazon", "Target", "Best Buy"], 80.0, 45.0),
    ("Entertainment", &["Netflix", "AMC Theatres", "Steam"], 25.0, 10.0),
];

const PAYMENT_METHODS: &[&str] = &["Credit Card", "Debit Card", "Cash", "Bank Transfer"];
const ACCOUNT_TYPES: &[&str] = &["Checking", "Savings", "Credit"];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;

    let output_path = "financial_transactions.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record([
        "transaction_id",
        "date",
        "amount",
        "category",
        "merchant",
        "payment_method",
        "account_type",
        "transaction_type",
        "description",
    ])?;

    let n_rows = 2000;
    for i in 0..n_rows {
        let (category, merchants, mean, spread) = CATEGORIES[rng.below(CATEGORIES.len())];
        let merchant = rng.pick(merchants);

        let when = start.and_hms_opt(0, 0, 0).context("invalid time")?
            + Duration::days(rng.below(366) as i64)
            + Duration::hours(7 + rng.below(16) as i64)
            + Duration::minutes(rng.below(60) as i64);

        let mut amount = rng.gauss(mean, spread).abs().max(1.0);
        // A handful of very large purchases for the outlier view.
        if i % 250 == 17 {
            amount *= 12.0;
        }
        let refund = rng.below(40) == 0;
        if refund {
            amount = -amount;
        }

        // Occasional untidy labels exercise trimming on load.
        let category_cell = if i % 97 == 0 {
            format!("  {category} ")
        } else {
            category.to_string()
        };

        writer.write_record([
            format!("TX{i:05}"),
            when.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{amount:.2}"),
            category_cell,
            merchant.to_string(),
            rng.pick(PAYMENT_METHODS).to_string(),
            rng.pick(ACCOUNT_TYPES).to_string(),
            if refund { "credit" } else { "debit" }.to_string(),
            format!("{category} at {merchant}"),
        ])?;
    }

    // One row with an unreadable date; the loader skips it.
    writer.write_record([
        "TX99999",
        "not-a-date",
        "10.00",
        "Dining",
        "Starbucks",
        "Cash",
        "Checking",
        "debit",
        "bad timestamp",
    ])?;
    writer.flush()?;

    println!("Wrote {} transactions to {output_path}", n_rows + 1);
    Ok(())
}
