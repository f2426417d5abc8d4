mod helpers;
mod open_meteo;
mod properties;
