use std::collections::BTreeSet;

use crate::ViewerOptions;
use tracing::error;

pub const DEFAULT_SERVER: &str = "http://localhost:8080";
pub const DEFAULT_FRAME_RATE: u32 = 60;

pub struct Args {
    pub server: String,
    pub datapath: Option<String>,
    pub frame_rate: u32,
    pub options: ViewerOptions,
}

impl Args {
    // parse arguments, return set of unrecognized args
    pub fn parse(args: &[String]) -> (Self, BTreeSet<String>) {
        let mut unrecognized_args = BTreeSet::new();
        let mut res = Args {
            server: DEFAULT_SERVER.to_string(),
            datapath: None,
            frame_rate: DEFAULT_FRAME_RATE,
            options: ViewerOptions::default(),
        };

        let mut i = 0;
        let len = args.len();
        while i < len {
            let arg = &args[i];

            if arg == "--debug" {
                res.options.set(ViewerOptions::Debug, true);
            } else if arg == "--no-live" {
                res.options.set(ViewerOptions::LiveSession, false);
            } else if arg == "--no-restart-watch" {
                res.options.set(ViewerOptions::RestartWatch, false);
            } else if arg == "-s" || arg == "--server" {
                i += 1;
                let Some(server) = args.get(i) else {
                    error!("server argument missing?");
                    continue;
                };
                res.server = server.trim_end_matches('/').to_string();
            } else if arg == "--datapath" {
                i += 1;
                let Some(path) = args.get(i) else {
                    error!("datapath argument missing?");
                    continue;
                };
                res.datapath = Some(path.clone());
            } else if arg == "--frame-rate" {
                i += 1;
                let Some(rate) = args.get(i) else {
                    error!("frame-rate argument missing?");
                    continue;
                };
                match rate.parse::<u32>() {
                    Ok(rate) if rate > 0 => res.frame_rate = rate,
                    _ => error!("failed to parse frame rate '{rate}', keeping {}", res.frame_rate),
                }
            } else {
                unrecognized_args.insert(arg.clone());
            }

            i += 1;
        }

        (res, unrecognized_args)
    }
}
