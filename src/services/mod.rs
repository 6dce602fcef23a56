pub mod food_facts; // Open Food Facts product search
pub mod nutrition;
pub mod ocr;
pub mod preprocess;

pub use food_facts::{OpenFoodFactsClient, ProductLookup};
pub use nutrition::NutritionResolver;
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use preprocess::ImagePreprocessor;
