//! Bundled synthetic training corpus
//!
//! Used to train the first model generation when the service starts, so the
//! classifier is usable before any user-provided labels arrive.

use crate::types::transaction::TransactionRecord;

/// Category catalog of the bundled dataset
pub const CATALOG: &[&str] = &[
    "Groceries",
    "Dining & Restaurants",
    "Transportation",
    "Shopping",
    "Entertainment",
    "Bills & Utilities",
    "Healthcare",
    "Travel",
    "Gas & Fuel",
    "Home & Garden",
    "Personal Care",
    "Education",
    "Insurance",
    "Income",
    "Transfer",
    "Other",
];

// (description, merchant, amount, category); an empty merchant means unknown
const SAMPLES: &[(&str, &str, f64, &str)] = &[
    ("WALMART GROCERY #1234", "Walmart", 87.42, "Groceries"),
    ("WHOLE FOODS MARKET", "Whole Foods", 52.18, "Groceries"),
    ("TRADER JOES #123", "Trader Joes", 45.67, "Groceries"),
    ("SAFEWAY STORE 2345", "Safeway", 93.22, "Groceries"),
    ("KROGER #0456", "Kroger", 68.90, "Groceries"),
    ("TARGET GROCERY", "Target", 71.34, "Groceries"),
    ("ALDI STORES", "Aldi", 42.15, "Groceries"),
    ("COSTCO WHOLESALE", "Costco", 156.78, "Groceries"),
    ("STARBUCKS COFFEE #1234", "Starbucks", 5.75, "Dining & Restaurants"),
    ("CHIPOTLE MEXICAN GRILL", "Chipotle", 12.45, "Dining & Restaurants"),
    ("MCDONALDS F12345", "McDonalds", 8.32, "Dining & Restaurants"),
    ("OLIVE GARDEN #789", "Olive Garden", 45.60, "Dining & Restaurants"),
    ("PANERA BREAD", "Panera", 15.23, "Dining & Restaurants"),
    ("DOMINOS PIZZA", "Dominos", 22.50, "Dining & Restaurants"),
    ("SUBWAY SANDWICH", "Subway", 9.45, "Dining & Restaurants"),
    ("TACO BELL #456", "Taco Bell", 11.20, "Dining & Restaurants"),
    ("DUNKIN DONUTS", "Dunkin", 6.89, "Dining & Restaurants"),
    ("UBER TRIP", "Uber", 23.45, "Transportation"),
    ("LYFT RIDE", "Lyft", 18.90, "Transportation"),
    ("METRO TRANSIT PASS", "Metro", 90.00, "Transportation"),
    ("PARKING METER", "", 5.00, "Transportation"),
    ("CAR WASH EXPRESS", "Car Wash", 15.00, "Transportation"),
    ("PUBLIC TRANSIT", "", 2.75, "Transportation"),
    ("SHELL OIL STATION", "Shell", 45.60, "Gas & Fuel"),
    ("CHEVRON #12345", "Chevron", 52.30, "Gas & Fuel"),
    ("BP GAS STATION", "BP", 48.75, "Gas & Fuel"),
    ("EXXONMOBIL", "Exxon", 41.20, "Gas & Fuel"),
    ("ARCO STATION", "Arco", 38.90, "Gas & Fuel"),
    ("AMAZON.COM PURCHASE", "Amazon", 67.89, "Shopping"),
    ("TARGET STORE #1234", "Target", 85.42, "Shopping"),
    ("BESTBUY.COM", "Best Buy", 234.99, "Shopping"),
    ("MACY'S #456", "Macys", 95.67, "Shopping"),
    ("HOME DEPOT #789", "Home Depot", 143.21, "Shopping"),
    ("NIKE STORE", "Nike", 89.99, "Shopping"),
    ("OLD NAVY", "Old Navy", 54.32, "Shopping"),
    ("NETFLIX SUBSCRIPTION", "Netflix", 15.99, "Entertainment"),
    ("SPOTIFY PREMIUM", "Spotify", 9.99, "Entertainment"),
    ("AMC THEATERS #123", "AMC", 28.50, "Entertainment"),
    ("STEAM GAMES", "Steam", 59.99, "Entertainment"),
    ("PLAYSTATION NETWORK", "PlayStation", 19.99, "Entertainment"),
    ("HULU STREAMING", "Hulu", 12.99, "Entertainment"),
    ("PG&E UTILITY BILL", "PG&E", 145.67, "Bills & Utilities"),
    ("COMCAST CABLE", "Comcast", 89.99, "Bills & Utilities"),
    ("VERIZON WIRELESS", "Verizon", 75.00, "Bills & Utilities"),
    ("AT&T PHONE SERVICE", "AT&T", 65.43, "Bills & Utilities"),
    ("WATER UTILITY PAYMENT", "", 45.23, "Bills & Utilities"),
    ("ELECTRIC COMPANY", "", 123.45, "Bills & Utilities"),
    ("WALGREENS PHARMACY", "Walgreens", 25.60, "Healthcare"),
    ("CVS PHARMACY #456", "CVS", 18.90, "Healthcare"),
    ("DENTIST OFFICE COPAY", "", 50.00, "Healthcare"),
    ("DR SMITH MEDICAL", "", 35.00, "Healthcare"),
    ("LABORATORY TESTS", "", 125.00, "Healthcare"),
    ("UNITED AIRLINES", "United", 345.60, "Travel"),
    ("MARRIOTT HOTEL", "Marriott", 189.99, "Travel"),
    ("AIRBNB RESERVATION", "Airbnb", 256.78, "Travel"),
    ("HERTZ CAR RENTAL", "Hertz", 156.34, "Travel"),
    ("DELTA AIR LINES", "Delta", 412.50, "Travel"),
    ("LOWES #1234", "Lowes", 87.65, "Home & Garden"),
    ("IKEA STORE", "IKEA", 234.56, "Home & Garden"),
    ("BED BATH & BEYOND", "Bed Bath Beyond", 67.89, "Home & Garden"),
    ("GARDENING SUPPLIES", "", 45.23, "Home & Garden"),
    ("SUPERCUTS HAIRCUT", "Supercuts", 25.00, "Personal Care"),
    ("SALON SERVICES", "", 85.00, "Personal Care"),
    ("SPA TREATMENT", "", 120.00, "Personal Care"),
    ("ULTA BEAUTY", "Ulta", 45.67, "Personal Care"),
    ("COURSERA COURSE", "Coursera", 49.99, "Education"),
    ("UDEMY LEARNING", "Udemy", 29.99, "Education"),
    ("COLLEGE TEXTBOOKS", "", 156.78, "Education"),
    ("TUITION PAYMENT", "", 2500.00, "Education"),
    ("GEICO INSURANCE", "Geico", 145.67, "Insurance"),
    ("STATE FARM AUTO", "State Farm", 178.90, "Insurance"),
    ("HEALTH INSURANCE PREMIUM", "", 456.78, "Insurance"),
    ("PAYROLL DEPOSIT", "", 3450.00, "Income"),
    ("DIRECT DEPOSIT SALARY", "", 2890.50, "Income"),
    ("FREELANCE PAYMENT", "", 850.00, "Income"),
    ("CASH DEPOSIT", "", 200.00, "Income"),
    ("TRANSFER TO SAVINGS", "", 500.00, "Transfer"),
    ("VENMO TRANSFER", "Venmo", 50.00, "Transfer"),
    ("PAYPAL TRANSFER", "PayPal", 75.00, "Transfer"),
    ("ZELLE PAYMENT", "Zelle", 100.00, "Transfer"),
];

/// Category catalog as owned strings
pub fn catalog_categories() -> Vec<String> {
    CATALOG.iter().map(|c| c.to_string()).collect()
}

/// The bundled corpus as parallel transaction and label vectors
pub fn bundled_dataset() -> (Vec<TransactionRecord>, Vec<String>) {
    SAMPLES
        .iter()
        .map(|&(description, merchant, amount, category)| {
            let record = TransactionRecord::new(description, amount);
            let record = if merchant.is_empty() {
                record
            } else {
                record.with_merchant(merchant)
            };
            (record, category.to_string())
        })
        .unzip()
}
