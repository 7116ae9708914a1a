pub mod noise_ball;
