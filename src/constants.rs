// Data file locations
pub const RAW_DATA_PATH: &str = "input/rawTrainingData.csv";
pub const LEARNING_DATA_PATH: &str = "input/learningData.csv";

// Model paths
pub const MODEL_PATH: &str = "stockPredictor";
pub const MODEL_EXTENSION: &str = "bin";
pub const METADATA_EXTENSION: &str = "meta.json";

// Model parameters
pub const WINDOW_SIZE: usize = 10; // Number of past prices fed to the network

// Normalization bounds, kept away from the sigmoid's saturation at 0 and 1
pub const NORMALIZED_LOW: f64 = 0.1;
pub const NORMALIZED_HIGH: f64 = 0.9;

// Learning rule
pub const LEARNING_RATE: f64 = 0.5;
pub const MAX_ITERATIONS: usize = 1000;
pub const MAX_ERROR: f64 = 0.00001;
pub const MIN_ERROR_CHANGE_ITERATIONS: usize = usize::MAX; // Unbounded unless configured
pub const MOMENTUM: f64 = 0.25;
pub const PROGRESS_INTERVAL: usize = 100;
pub const TRAINING_SEED: u64 = 42;

// Hand-picked evaluation window (daily closes) and the close that followed it
pub const EVALUATION_WINDOW: [f64; WINDOW_SIZE] = [
    2089.27, 2108.1, 2104.42, 2091.5, 2061.05, 2056.15, 2061.02, 2086.24, 2067.89, 2059.69,
];
pub const EVALUATION_EXPECTED: f64 = 2066.96;
