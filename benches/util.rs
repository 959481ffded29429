const GENRES: [&str; 4] = ["Drama", "Action", "Comedy", "Crime"];
const COUNTRIES: [&str; 4] = ["US", "FR", "KR", "DE"];

/// Builds a movies CSV with `rows` records. Every seventh record lacks a tagline.
pub fn movies_csv(rows: u64) -> Vec<u8> {
    let mut csv = String::from("genres,title_movie,production_countries,Release_year,Runtime,tagline\n");
    for i in 0..rows {
        let n = i as usize;
        let tagline = if i % 7 == 0 { String::new() } else { format!("Tagline {}", i) };
        csv.push_str(&format!(
            "{},Movie {},{},{},{},{}\n",
            GENRES[n % GENRES.len()],
            i,
            COUNTRIES[n % COUNTRIES.len()],
            1990 + (i * 31) % 30,
            80 + (i * 17) % 100,
            tagline,
        ));
    }
    csv.into_bytes()
}
