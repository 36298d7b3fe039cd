pub mod step_1_normalization;
pub mod step_2_sliding_window;
pub mod step_3_mlp_model_arch;
pub mod step_4_train_model;
pub mod step_5_prediction;
pub mod step_6_model_serialization;
