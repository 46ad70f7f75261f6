use std::sync::Once;

static LOGGER_INIT: Once = Once::new();

/// Initializes the `log4rs` logger from `log4rs.yaml`, falling back to a
/// basic console logger when the file is absent or malformed.
pub fn init() {
    LOGGER_INIT.call_once(|| {
        match log4rs::init_file("log4rs.yaml", Default::default()) {
            Ok(_) => {
                log::info!("dphist logging initialized from log4rs.yaml.");
            }
            Err(e) => {
                eprintln!(
                    "WARN: could not initialize logger from log4rs.yaml: {}. \
                     Falling back to basic stdout logging.",
                    e
                );

                let stdout_appender =
                    log4rs::append::console::ConsoleAppender::builder()
                        .encoder(Box::new(
                            log4rs::encode::pattern::PatternEncoder::new(
                                "{h({d(%Y-%m-%d %H:%M:%S)(utc)} - {l}: {m}{n})}",
                            ),
                        ))
                        .build();

                let config = log4rs::config::Config::builder()
                    .appender(
                        log4rs::config::Appender::builder()
                            .build("stdout", Box::new(stdout_appender)),
                    )
                    .build(
                        log4rs::config::Root::builder()
                            .appender("stdout")
                            .build(log::LevelFilter::Debug),
                    );

                match config {
                    Ok(config) => {
                        if let Err(init_err) = log4rs::init_config(config) {
                            eprintln!(
                                "ERROR: failed to initialize fallback \
                                 logger: {}. No logging will be available.",
                                init_err
                            );
                        }
                    }
                    Err(build_err) => {
                        eprintln!(
                            "ERROR: failed to build fallback logging \
                             configuration: {}. No logging will be available.",
                            build_err
                        );
                    }
                }
            }
        }
    });
}
